//! The cipher service: passphrase in, bytes in, bytes out
//!
//! A [`CipherService`] pairs a [`Scheme`] with an [`EventSink`]. It holds no
//! other state, so one instance can be cloned or shared across threads and
//! used for any number of independent calls.

use crate::aescrypt;
use crate::error::Result;
use crate::events::{CipherEvent, Direction, EventSink, LogSink};
use crate::secretcrypt;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How bytes are transformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// AES-128/ECB/PKCS#7 with the key truncated from the passphrase.
    /// Deterministic and unauthenticated; compatible with existing files.
    #[default]
    AesEcb,
    /// scrypt + XSalsa20Poly1305 with random salt and nonce. Detects
    /// tampering and wrong passphrases.
    SecretBox,
}

impl Scheme {
    pub fn name(&self) -> &'static str {
        match self {
            Scheme::AesEcb => "aes-ecb",
            Scheme::SecretBox => "secretbox",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "aes-ecb" => Ok(Scheme::AesEcb),
            "secretbox" => Ok(Scheme::SecretBox),
            other => Err(format!(
                "unknown scheme {:?} (expected \"aes-ecb\" or \"secretbox\")",
                other
            )),
        }
    }
}

#[derive(Clone)]
pub struct CipherService {
    scheme: Scheme,
    sink: Arc<dyn EventSink>,
}

impl CipherService {
    /// A service for `scheme` that reports to the `log` facade.
    pub fn new(scheme: Scheme) -> Self {
        Self {
            scheme,
            sink: Arc::new(LogSink),
        }
    }

    /// Replace the event sink.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Same sink, different scheme.
    pub fn with_scheme(&self, scheme: Scheme) -> Self {
        Self {
            scheme,
            sink: Arc::clone(&self.sink),
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Encrypt `data` in one call.
    ///
    /// Fails with `InvalidPassphrase` if the passphrase is shorter than 16
    /// UTF-8 bytes, or `EncryptionFailure` if the cipher itself fails.
    pub fn encrypt(&self, data: &[u8], passphrase: &str) -> Result<Vec<u8>> {
        self.run(Direction::Encrypt, data, || match self.scheme {
            Scheme::AesEcb => aescrypt::encrypt(passphrase, data),
            Scheme::SecretBox => secretcrypt::encrypt(passphrase, data),
        })
    }

    /// Decrypt `data` in one call.
    ///
    /// Only the right passphrase on unmodified ciphertext is guaranteed to
    /// give back the plaintext. Under `AesEcb` a wrong passphrase usually
    /// fails padding validation but can also yield garbage.
    pub fn decrypt(&self, data: &[u8], passphrase: &str) -> Result<Vec<u8>> {
        self.run(Direction::Decrypt, data, || match self.scheme {
            Scheme::AesEcb => aescrypt::decrypt(passphrase, data),
            Scheme::SecretBox => secretcrypt::decrypt(passphrase, data),
        })
    }

    fn run(
        &self,
        direction: Direction,
        data: &[u8],
        op: impl FnOnce() -> Result<Vec<u8>>,
    ) -> Result<Vec<u8>> {
        self.sink.emit(&CipherEvent::Started {
            direction,
            scheme: self.scheme,
            input_len: data.len(),
        });

        let result = op();

        let event = match &result {
            Ok(output) => CipherEvent::Succeeded {
                direction,
                scheme: self.scheme,
                output_len: output.len(),
            },
            Err(e) => CipherEvent::Failed {
                direction,
                scheme: self.scheme,
                kind: e.kind,
                message: e.to_string(),
            },
        };
        self.sink.emit(&event);

        result
    }
}

impl Default for CipherService {
    fn default() -> Self {
        Self::new(Scheme::default())
    }
}

impl fmt::Debug for CipherService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherService")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

/// Encrypt with AES-128/ECB, reporting to the `log` facade.
pub fn encrypt(data: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    CipherService::default().encrypt(data, passphrase)
}

/// Decrypt with AES-128/ECB, reporting to the `log` facade.
pub fn decrypt(data: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    CipherService::default().decrypt(data, passphrase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::events::MemorySink;

    const PASSPHRASE: &str = "thisisaverysecurekey!";

    fn recording(scheme: Scheme) -> (CipherService, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let service = CipherService::new(scheme).with_sink(sink.clone());
        (service, sink)
    }

    #[test]
    fn test_scheme_parse_and_display() {
        for scheme in [Scheme::AesEcb, Scheme::SecretBox] {
            assert_eq!(scheme.to_string().parse::<Scheme>(), Ok(scheme));
        }
        assert!("aes".parse::<Scheme>().is_err());
        assert_eq!(Scheme::default(), Scheme::AesEcb);
    }

    #[test]
    fn test_success_events() {
        let (service, sink) = recording(Scheme::AesEcb);
        let ciphertext = service.encrypt(b"Hello, World!", PASSPHRASE).unwrap();
        service.decrypt(&ciphertext, PASSPHRASE).unwrap();

        assert_eq!(
            sink.events(),
            vec![
                CipherEvent::Started {
                    direction: Direction::Encrypt,
                    scheme: Scheme::AesEcb,
                    input_len: 13,
                },
                CipherEvent::Succeeded {
                    direction: Direction::Encrypt,
                    scheme: Scheme::AesEcb,
                    output_len: 16,
                },
                CipherEvent::Started {
                    direction: Direction::Decrypt,
                    scheme: Scheme::AesEcb,
                    input_len: 16,
                },
                CipherEvent::Succeeded {
                    direction: Direction::Decrypt,
                    scheme: Scheme::AesEcb,
                    output_len: 13,
                },
            ]
        );
    }

    #[test]
    fn test_failure_events() {
        let (service, sink) = recording(Scheme::AesEcb);
        let err = service.encrypt(b"Test Data", "short").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPassphrase);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        match &events[1] {
            CipherEvent::Failed {
                direction,
                kind,
                message,
                ..
            } => {
                assert_eq!(*direction, Direction::Encrypt);
                assert_eq!(*kind, ErrorKind::InvalidPassphrase);
                assert!(message.contains("at least 16 characters"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_decrypt_failure_event() {
        let (service, sink) = recording(Scheme::AesEcb);
        service.decrypt(&[0u8; 7], PASSPHRASE).unwrap_err();

        assert!(matches!(
            sink.events().last(),
            Some(CipherEvent::Failed {
                direction: Direction::Decrypt,
                kind: ErrorKind::EncryptionFailure,
                ..
            })
        ));
    }

    #[test]
    fn test_with_scheme_keeps_sink() {
        let (service, sink) = recording(Scheme::AesEcb);
        let other = service.with_scheme(Scheme::SecretBox);
        assert_eq!(other.scheme(), Scheme::SecretBox);

        other.encrypt(b"x", "short").unwrap_err();
        assert_eq!(sink.events().len(), 2);
    }

    #[test]
    fn test_concurrent_callers() {
        let (service, sink) = recording(Scheme::AesEcb);
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let service = service.clone();
                std::thread::spawn(move || {
                    let data = vec![i; 40 + i as usize];
                    let ciphertext = service.encrypt(&data, PASSPHRASE).unwrap();
                    assert_eq!(service.decrypt(&ciphertext, PASSPHRASE).unwrap(), data);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sink.events().len(), 8 * 4);
    }
}
