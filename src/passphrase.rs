//! Passphrase acquisition for the command-line front end

use crate::error::{ErrorCategory, ErrorKind, PasslockError, Result};
use crate::key::MIN_PASSPHRASE_LEN;
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Trait for reading passphrases from various sources
pub trait PassphraseReader {
    /// Read a passphrase. Only UTF-8 text is accepted.
    ///
    /// Returns the passphrase wrapped in `Zeroizing` so it is wiped from
    /// memory when dropped.
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>>;
}

/// Returns a fixed passphrase (for testing)
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<String>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        Ok(self.passphrase.clone())
    }
}

/// Reads the whole of any io::Read source as the passphrase
///
/// One trailing line ending (`\n` or `\r\n`) is dropped, so a passphrase
/// piped in with `echo` matches the same passphrase typed at the terminal.
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
}

impl ReaderPassphraseReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            PasslockError::io(
                ErrorCategory::Internal,
                format!("error reading passphrase: {}", e),
                e,
            )
        })?;

        let mut line = &data[..];
        if let Some(rest) = line.strip_suffix(b"\n") {
            line = rest.strip_suffix(b"\r").unwrap_or(rest);
        }

        let text = std::str::from_utf8(line).map_err(|e| {
            PasslockError::with_source(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "passphrase is not valid UTF-8",
                e,
            )
        })?;
        Ok(Zeroizing::new(text.to_owned()))
    }
}

/// Reads passphrase from terminal with no echo
#[derive(Default)]
pub struct TerminalPassphraseReader;

impl TerminalPassphraseReader {
    pub fn new() -> Self {
        Self
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        if !io::stdin().is_terminal() {
            return Err(PasslockError::new(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read passphrase from terminal - stdin is not a terminal",
            ));
        }

        let mut stderr = io::stderr();
        stderr
            .write_all(
                format!("Passphrase (min {} chars): ", MIN_PASSPHRASE_LEN).as_bytes(),
            )
            .and_then(|_| stderr.flush())
            .map_err(|e| {
                PasslockError::io(
                    ErrorCategory::Internal,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;

        let passphrase = rpassword::read_password().map_err(|e| {
            PasslockError::with_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("failure reading passphrase: {}", e),
                e,
            )
        })?;

        Ok(Zeroizing::new(passphrase))
    }
}

/// Pre-flight check run by the front end before handing a passphrase to
/// the cipher: it must not be blank and must have at least 16 characters.
///
/// The cipher applies its own (byte-based) check regardless.
pub fn check_passphrase(passphrase: &str) -> Result<()> {
    if passphrase.trim().is_empty() {
        return Err(PasslockError::new(
            ErrorCategory::User,
            ErrorKind::InvalidPassphrase,
            "passphrase is required",
        ));
    }
    if passphrase.chars().count() < MIN_PASSPHRASE_LEN {
        return Err(PasslockError::new(
            ErrorCategory::User,
            ErrorKind::InvalidPassphrase,
            format!(
                "passphrase must be at least {} characters",
                MIN_PASSPHRASE_LEN
            ),
        ));
    }
    Ok(())
}
