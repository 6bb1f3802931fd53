//! Passphrase to key derivation for the AES scheme
//!
//! The key is the first 16 bytes of the passphrase's UTF-8 encoding. There
//! is no hashing, salting or stretching involved, so two passphrases that
//! share a 16-byte prefix yield the same key.

use crate::error::{PasslockError, Result};
use zeroize::Zeroizing;

/// Length of the derived key in bytes (AES-128).
pub const KEY_LEN: usize = 16;

/// Minimum passphrase length, counted in UTF-8 bytes.
pub const MIN_PASSPHRASE_LEN: usize = KEY_LEN;

/// A 16-byte key owned by a single encrypt or decrypt call.
///
/// Wiped from memory on drop.
pub struct DerivedKey(Zeroizing<[u8; KEY_LEN]>);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Rejects passphrases shorter than `MIN_PASSPHRASE_LEN` UTF-8 bytes.
pub(crate) fn ensure_passphrase_len(passphrase: &str) -> Result<()> {
    let len = passphrase.len();
    if len < MIN_PASSPHRASE_LEN {
        return Err(PasslockError::invalid_passphrase(format!(
            "invalid passphrase: passphrase must be at least {} characters long (got {} bytes)",
            MIN_PASSPHRASE_LEN, len
        )));
    }
    Ok(())
}

/// Derive the AES key by truncating the passphrase to its first 16 bytes.
///
/// Truncation happens on bytes, not characters, so a multi-byte character
/// straddling byte 16 is cut in half. That matches how existing ciphertext
/// was produced.
pub fn derive_key(passphrase: &str) -> Result<DerivedKey> {
    ensure_passphrase_len(passphrase)?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&passphrase.as_bytes()[..KEY_LEN]);
    Ok(DerivedKey(key))
}
