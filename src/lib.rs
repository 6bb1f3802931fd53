//! Passlock - passphrase-based encryption of byte buffers and files
//!
//! The core is [`encrypt`] / [`decrypt`]: AES-128 keyed by the first 16
//! bytes of the passphrase, one call per buffer. [`CipherService`] offers
//! the same two operations with a choice of [`Scheme`] and an injectable
//! [`EventSink`](events::EventSink) for lifecycle events.
//!
//! ```
//! let ciphertext = passlock::encrypt(b"Hello, World!", "thisisaverysecurekey!")?;
//! let plaintext = passlock::decrypt(&ciphertext, "thisisaverysecurekey!")?;
//! assert_eq!(plaintext, b"Hello, World!");
//! # Ok::<(), passlock::PasslockError>(())
//! ```

#![forbid(unsafe_code)]

pub mod aescrypt;
pub mod cipher;
pub mod error;
pub mod events;
pub mod file_ops;
pub mod key;
pub mod passphrase;
pub mod secretcrypt;
pub mod varmor;

pub use cipher::{CipherService, Scheme, decrypt, encrypt};
pub use error::{CipherFault, ErrorCategory, ErrorKind, PasslockError, Result};
