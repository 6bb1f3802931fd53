use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to the caller.
    ///
    /// Use of Internal is never a guarantee that the error is not due to
    /// bad input, merely that the code cannot tell.
    Internal,

    /// The caller provided invalid input or asked for something that is
    /// unsupported or impossible to complete.
    User,
}

/// Condition tags for consumers that want to branch on error kinds.
///
/// The cipher operations only ever produce `InvalidPassphrase` or
/// `EncryptionFailure`. The remaining kinds come from the surrounding file,
/// armor and passphrase plumbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The passphrase is too short (or blank). Raised before any
    /// cryptographic work happens, so no data has been touched.
    InvalidPassphrase,
    /// The cryptographic transform itself failed: bad padding, bad length,
    /// failed authentication or any other lower-level cipher fault.
    /// Retrying with the same inputs fails the same way.
    EncryptionFailure,
    /// The armored representation is malformed.
    ArmoringInvalid,
    /// Base64 decoding of the armored payload failed.
    ArmoringDecode,
    /// Input claimed to be passlock armor but used an unknown version.
    ArmoringFromFuture,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// The output path already exists and overwriting was not allowed.
    OutputExists,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

/// Lower-level cipher faults, carried as the source of an
/// `EncryptionFailure`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CipherFault {
    #[error("key material has invalid length {0}")]
    InvalidKeyLength(usize),
    #[error("input length {len} is not a positive multiple of the {block_size}-byte block size")]
    UnalignedLength { len: usize, block_size: usize },
    #[error("padding validation failed")]
    BadPadding,
    #[error("input likely truncated while reading {0}")]
    Truncated(&'static str),
    #[error("negative sealed box length")]
    NegativeLength,
    #[error("claimed sealed box length {0} greater than available input")]
    LengthExceedsInput(u64),
    #[error("unexpected data after sealed box")]
    TrailingData,
    #[error("corrupt input, tampered-with data, or bad passphrase")]
    AuthenticationFailed,
    #[error("scrypt key derivation failed: {0}")]
    Scrypt(String),
    #[error("secretbox failed to seal data")]
    Seal,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct PasslockError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Specific condition tag.
    pub kind: ErrorKind,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl PasslockError {
    /// Creates a new error with a category, kind and display message.
    pub fn new(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that retains the originating source error.
    pub fn with_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind,
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    pub(crate) fn invalid_passphrase(msg: impl Into<String>) -> Self {
        Self::new(ErrorCategory::User, ErrorKind::InvalidPassphrase, msg)
    }

    /// A failed transform. The fault's own text is appended to `msg` so the
    /// display form is useful without walking the source chain.
    pub(crate) fn encryption_failure(msg: &str, fault: CipherFault) -> Self {
        let category = match fault {
            CipherFault::Scrypt(_) | CipherFault::Seal | CipherFault::InvalidKeyLength(_) => {
                ErrorCategory::Internal
            }
            _ => ErrorCategory::User,
        };
        Self::with_source(
            category,
            ErrorKind::EncryptionFailure,
            format!("{}: {}", msg, fault),
            fault,
        )
    }

    pub(crate) fn io(
        category: ErrorCategory,
        msg: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::with_source(category, ErrorKind::Io, msg, source)
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Returns the cipher fault behind an `EncryptionFailure`, looking
    /// through any context layers added on the way up.
    pub fn cipher_fault(&self) -> Option<&CipherFault> {
        let source = self.source.as_deref()?;
        if let Some(fault) = source.downcast_ref::<CipherFault>() {
            return Some(fault);
        }
        source
            .downcast_ref::<PasslockError>()
            .and_then(PasslockError::cipher_fault)
    }

    /// Wraps the current error with a higher-level message while preserving
    /// the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, PasslockError>;
