//! Versioned armoring for ciphertext
//!
//! Wraps raw ciphertext in base64url with a prefix naming the scheme that
//! produced it, so a text file can be decrypted without being told which
//! scheme to use. The armored format is:
//! - Free of whitespace (including newlines)
//! - Safe to embed in URLs
//! - Safe to pass unescaped in a POSIX shell

use crate::cipher::Scheme;
use crate::error::{ErrorCategory, ErrorKind, PasslockError, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Magic prefix shared by all versions
const MAGIC_PREFIX: &str = "passlock";

/// AES-128/ECB ciphertext
const V1_MAGIC: &str = "passlock1:";

/// Secretbox ciphertext
const V2_MAGIC: &str = "passlock2:";

fn magic(scheme: Scheme) -> &'static str {
    match scheme {
        Scheme::AesEcb => V1_MAGIC,
        Scheme::SecretBox => V2_MAGIC,
    }
}

/// Wrap ciphertext produced by `scheme`.
///
/// Format: passlock{version}:{base64url-no-padding}
pub fn wrap(scheme: Scheme, body: &[u8]) -> String {
    format!("{}{}", magic(scheme), URL_SAFE_NO_PAD.encode(body))
}

/// Unwrap an armored string, returning the scheme and the raw ciphertext.
pub fn unwrap(armored: &str) -> Result<(Scheme, Vec<u8>)> {
    // Tolerate the trailing newline editors like to add.
    let armored = armored.trim_end();

    if armored.len() < V1_MAGIC.len() {
        return Err(PasslockError::new(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "input size smaller than magic marker; likely truncated",
        ));
    }

    let (scheme, encoded) = if let Some(encoded) = armored.strip_prefix(V1_MAGIC) {
        (Scheme::AesEcb, encoded)
    } else if let Some(encoded) = armored.strip_prefix(V2_MAGIC) {
        (Scheme::SecretBox, encoded)
    } else if armored.starts_with(MAGIC_PREFIX) {
        return Err(PasslockError::new(
            ErrorCategory::User,
            ErrorKind::ArmoringFromFuture,
            "input claims to be passlock armor, but not a version we support",
        ));
    } else {
        return Err(PasslockError::new(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "input unrecognized as passlock armor",
        ));
    };

    let body = URL_SAFE_NO_PAD.decode(encoded).map_err(|e| {
        PasslockError::with_source(
            ErrorCategory::User,
            ErrorKind::ArmoringDecode,
            format!("base64 decoding failed: {}", e),
            e,
        )
    })?;
    Ok((scheme, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_survives_wrapping() {
        for scheme in [Scheme::AesEcb, Scheme::SecretBox] {
            let armored = wrap(scheme, b"test");
            assert_eq!(unwrap(&armored).unwrap(), (scheme, b"test".to_vec()));
        }
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(wrap(Scheme::AesEcb, b""), "passlock1:");
        assert_eq!(unwrap("passlock1:").unwrap(), (Scheme::AesEcb, Vec::new()));
    }

    #[test]
    fn test_exact_output() {
        let bytes: Vec<u8> = (0..=255).collect();
        let armored = wrap(Scheme::SecretBox, &bytes);
        assert_eq!(
            armored,
            "passlock2:AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8gISIjJCUmJygpKissLS4vMDEyMzQ1Njc4OTo7PD0-P0BBQkNERUZHSElKS0xNTk9QUVJTVFVWV1hZWltcXV5fYGFiY2RlZmdoaWprbG1ub3BxcnN0dXZ3eHl6e3x9fn-AgYKDhIWGh4iJiouMjY6PkJGSk5SVlpeYmZqbnJ2en6ChoqOkpaanqKmqq6ytrq-wsbKztLW2t7i5uru8vb6_wMHCw8TFxsfIycrLzM3Oz9DR0tPU1dbX2Nna29zd3t_g4eLj5OXm5-jp6uvs7e7v8PHy8_T19vf4-fr7_P3-_w"
        );
    }

    #[test]
    fn test_trailing_newline_tolerated() {
        let armored = format!("{}\n", wrap(Scheme::AesEcb, b"abc"));
        assert_eq!(unwrap(&armored).unwrap().1, b"abc");
    }

    #[test]
    fn test_truncated_input() {
        let err = unwrap("").expect_err("expected truncated input error");
        assert_eq!(err.kind, ErrorKind::ArmoringInvalid);
    }

    #[test]
    fn test_wrong_version() {
        let err = unwrap("passlock999999:...").expect_err("expected unsupported version error");
        assert_eq!(err.kind, ErrorKind::ArmoringFromFuture);
    }

    #[test]
    fn test_not_passlock() {
        let err = unwrap("something not looking like passlock data")
            .expect_err("expected non-passlock error");
        assert_eq!(err.kind, ErrorKind::ArmoringInvalid);
    }

    #[test]
    fn test_bad_base64() {
        let err = unwrap("passlock1:bad$$").expect_err("expected base64 decode error");
        assert_eq!(err.kind, ErrorKind::ArmoringDecode);
    }

    #[test]
    fn test_url_and_shell_safe() {
        let armored = wrap(Scheme::AesEcb, &[0xffu8; 100]);
        for c in [' ', '\n', '\t', '+', '/', '='] {
            assert!(!armored.contains(c), "armor contains {:?}", c);
        }
    }
}
