//! Whole-file encryption and decryption
//!
//! Files are read fully into memory, run through a [`CipherService`] and
//! written back out. Nothing here streams.

use crate::cipher::CipherService;
use crate::error::{ErrorCategory, ErrorKind, PasslockError, Result};
use crate::events::Direction;
use crate::passphrase::{PassphraseReader, check_passphrase};
use crate::varmor;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// How ciphertext is stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Raw cipher output.
    #[default]
    Raw,
    /// Text armor carrying the scheme (see [`varmor`]).
    Armored,
}

/// Options shared by the file operations.
#[derive(Debug, Clone, Default)]
pub struct FileOptions {
    pub service: CipherService,
    pub encoding: Encoding,
    /// Replace an existing output file instead of failing.
    pub overwrite: bool,
}

/// The default output for `input`: a sibling file named `encrypted_<name>`
/// or `decrypted_<name>`.
pub fn default_output_path(input: &Path, direction: Direction) -> Result<PathBuf> {
    let name = input.file_name().ok_or_else(|| {
        PasslockError::new(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("{} does not name a file", input.display()),
        )
    })?;
    let prefix = match direction {
        Direction::Encrypt => "encrypted_",
        Direction::Decrypt => "decrypted_",
    };
    let mut output_name = std::ffi::OsString::from(prefix);
    output_name.push(name);
    Ok(input.with_file_name(output_name))
}

/// Encrypt a file with a passphrase
///
/// Reads plaintext from `input_path`, encrypts it using a passphrase from
/// `passphrase_reader`, and writes the ciphertext to `output_path`.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn encrypt_file(
    input_path: &Path,
    output_path: &Path,
    options: &FileOptions,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    ensure_writable(output_path, options.overwrite)?;
    let plaintext = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let passphrase = passphrase_reader.read_passphrase()?;
    check_passphrase(&passphrase)?;

    let ciphertext = options
        .service
        .encrypt(&plaintext, &passphrase)
        .map_err(|e| e.with_context(format!("failed to encrypt {}", input_path.display())))?;
    let output = match options.encoding {
        Encoding::Raw => ciphertext,
        Encoding::Armored => varmor::wrap(options.service.scheme(), &ciphertext).into_bytes(),
    };

    write_atomically(output_path, &output, options.overwrite)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))
}

/// Decrypt a file with a passphrase
///
/// Reads ciphertext from `input_path`, decrypts it using a passphrase from
/// `passphrase_reader`, and writes the plaintext to `output_path`. Armored
/// input is decrypted with the scheme named in its armor.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn decrypt_file(
    input_path: &Path,
    output_path: &Path,
    options: &FileOptions,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    ensure_writable(output_path, options.overwrite)?;
    let data = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let passphrase = passphrase_reader.read_passphrase()?;
    check_passphrase(&passphrase)?;

    let plaintext = open(&data, &passphrase, options)
        .map_err(|e| e.with_context(format!("failed to decrypt {}", input_path.display())))?;

    write_atomically(output_path, &plaintext, options.overwrite)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))
}

/// Update an encrypted file with new plaintext using the same passphrase
///
/// This function:
/// 1. Decrypts the existing file at `crypt_path` to validate the passphrase
/// 2. Reads new plaintext from `plain_path`
/// 3. Encrypts the new plaintext with the validated passphrase, in the
///    encoding and scheme of the existing file
/// 4. Atomically writes to `crypt_path` (tempfile + fsync + rename)
///
/// With the AES scheme a wrong passphrase is not always caught in step 1.
pub fn update_file(
    plain_path: &Path,
    crypt_path: &Path,
    options: &FileOptions,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let existing = fs::read(crypt_path).map_err(|e| read_error(crypt_path, e))?;
    let passphrase = passphrase_reader.read_passphrase()?;
    check_passphrase(&passphrase)?;

    let service = match options.encoding {
        Encoding::Raw => options.service.clone(),
        Encoding::Armored => {
            let (scheme, _) = unarmor(&existing)?;
            options.service.with_scheme(scheme)
        }
    };
    let options = FileOptions {
        service,
        ..options.clone()
    };

    // Validate passphrase by decrypting existing file (discard plaintext)
    open(&existing, &passphrase, &options)
        .map_err(|e| e.with_context(format!("failed to decrypt {}", crypt_path.display())))?;

    let new_plaintext = fs::read(plain_path).map_err(|e| read_error(plain_path, e))?;
    let ciphertext = options
        .service
        .encrypt(&new_plaintext, &passphrase)
        .map_err(|e| e.with_context(format!("failed to encrypt {}", plain_path.display())))?;
    let output = match options.encoding {
        Encoding::Raw => ciphertext,
        Encoding::Armored => varmor::wrap(options.service.scheme(), &ciphertext).into_bytes(),
    };

    write_atomically(crypt_path, &output, true)
}

fn open(data: &[u8], passphrase: &str, options: &FileOptions) -> Result<Vec<u8>> {
    match options.encoding {
        Encoding::Raw => options.service.decrypt(data, passphrase),
        Encoding::Armored => {
            let (scheme, ciphertext) = unarmor(data)?;
            options.service.with_scheme(scheme).decrypt(&ciphertext, passphrase)
        }
    }
}

fn unarmor(data: &[u8]) -> Result<(crate::cipher::Scheme, Vec<u8>)> {
    let armored = std::str::from_utf8(data).map_err(|e| {
        PasslockError::with_source(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "armored input is not valid UTF-8",
            e,
        )
    })?;
    varmor::unwrap(armored).map_err(|e| e.with_context("failed to unarmor"))
}

fn ensure_writable(path: &Path, overwrite: bool) -> Result<()> {
    if !overwrite && path.exists() {
        return Err(PasslockError::new(
            ErrorCategory::User,
            ErrorKind::OutputExists,
            format!(
                "{} already exists; refusing to overwrite",
                path.display()
            ),
        ));
    }
    Ok(())
}

/// Write `contents` to `path` via a tempfile in the same directory
/// (tempfile + fsync + rename), so `path` is either untouched or complete.
///
/// Unless `overwrite` is set the rename refuses to replace an existing
/// file. The tempfile is created 0o600 on Unix and the rename keeps that.
fn write_atomically(path: &Path, contents: &[u8], overwrite: bool) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| PasslockError::io(ErrorCategory::Internal, "failed to create tempfile", e))?;

    temp_file
        .write_all(contents)
        .map_err(|e| PasslockError::io(ErrorCategory::Internal, "failed to write to tempfile", e))?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file
        .flush()
        .map_err(|e| PasslockError::io(ErrorCategory::Internal, "failed to flush tempfile", e))?;
    temp_file.as_file().sync_all().map_err(|e| {
        PasslockError::io(
            ErrorCategory::Internal,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    let persisted = if overwrite {
        temp_file.persist(path)
    } else {
        temp_file.persist_noclobber(path)
    };
    persisted.map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            PasslockError::with_source(
                ErrorCategory::User,
                ErrorKind::OutputExists,
                format!("{} already exists; refusing to overwrite", path.display()),
                e.error,
            )
        } else {
            PasslockError::io(
                ErrorCategory::Internal,
                format!("failed to rename to target file {}", path.display()),
                e.error,
            )
        }
    })?;
    Ok(())
}

fn read_error(path: &Path, err: io::Error) -> PasslockError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    PasslockError::io(category, format!("failed to read from {}", path.display()), err)
}
