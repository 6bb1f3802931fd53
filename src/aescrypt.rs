//! AES-128 in ECB mode with PKCS#7 padding
//!
//! This is the scheme produced by asking a JCE-style provider for plain
//! "AES": no IV, no authentication, key taken directly from the passphrase.
//! The ciphertext is the raw cipher output with nothing prepended.

use crate::error::{CipherFault, PasslockError, Result};
use crate::key;
use aes::Aes128;
use ecb::cipher::block_padding::Pkcs7;
use ecb::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit};

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

type Aes128EcbEnc = ecb::Encryptor<Aes128>;
type Aes128EcbDec = ecb::Decryptor<Aes128>;

/// Encrypt `plaintext` under a key derived from `passphrase`.
///
/// Output length is the input length rounded up to the next block, and is
/// never zero: empty input produces one full block of padding.
pub fn encrypt(passphrase: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
    let key = key::derive_key(passphrase)?;

    let cipher = Aes128EcbEnc::new_from_slice(key.as_bytes()).map_err(|_| {
        PasslockError::encryption_failure(
            "encryption failed",
            CipherFault::InvalidKeyLength(key.as_bytes().len()),
        )
    })?;

    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt `ciphertext` under a key derived from `passphrase`.
///
/// Without authentication a wrong passphrase is only noticed when the
/// padding happens not to validate. Otherwise the result is garbage.
pub fn decrypt(passphrase: &str, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let key = key::derive_key(passphrase)?;

    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(PasslockError::encryption_failure(
            "decryption failed",
            CipherFault::UnalignedLength {
                len: ciphertext.len(),
                block_size: BLOCK_SIZE,
            },
        ));
    }

    let cipher = Aes128EcbDec::new_from_slice(key.as_bytes()).map_err(|_| {
        PasslockError::encryption_failure(
            "decryption failed",
            CipherFault::InvalidKeyLength(key.as_bytes().len()),
        )
    })?;

    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| PasslockError::encryption_failure("decryption failed", CipherFault::BadPadding))
}
