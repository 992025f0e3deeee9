//! Key material handling for the stegokit embedding methods.
//!
//! Two independent derivations come out of one passphrase:
//!
//! - [`ShuffleSource`]: a reproducible pseudo-random stream used for
//!   position shuffling and keystream obfuscation. Deterministic across
//!   process runs, since extraction must regenerate the identical order.
//!   This is an obfuscation layer, not the confidentiality boundary.
//! - [`encrypt_data`] / [`decrypt_data`]: the actual confidentiality
//!   boundary, Argon2id key derivation plus XChaCha20-Poly1305.

use argon2::{Argon2, ParamsBuilder};
use chacha20poly1305::aead::{Aead, AeadCore};
use chacha20poly1305::{KeyInit, XChaCha20Poly1305};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

pub mod error;

pub use crate::error::CryptoError;

const NONCE_LEN: usize = 24;
const SALT_LEN: usize = 32;
const TAG_LEN: usize = 16;

/// Fixed size overhead added by [`encrypt_data`]: auth tag + nonce + salt.
pub const ENCRYPTION_OVERHEAD: usize = TAG_LEN + NONCE_LEN + SALT_LEN;

pub type Result<T> = std::result::Result<T, CryptoError>;

/// Decrypts data produced by [`encrypt_data`] under the same passphrase.
///
/// A wrong passphrase fails authentication and yields
/// [`CryptoError::DecryptionError`] without any structural detail, so the
/// caller cannot distinguish a wrong key from corrupted data.
pub fn decrypt_data(passphrase: &str, data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < ENCRYPTION_OVERHEAD {
        return Err(CryptoError::CipherDataTooShort);
    }
    let salt = &data[data.len() - SALT_LEN..];
    let nonce = &data[data.len() - SALT_LEN - NONCE_LEN..data.len() - SALT_LEN];
    let mut key = derive_key(passphrase.as_bytes(), salt)?;

    let decryptor = XChaCha20Poly1305::new(&key.into());
    let decipher_data = decryptor
        .decrypt(nonce.into(), &data[0..data.len() - SALT_LEN - NONCE_LEN])
        .map_err(CryptoError::DecryptionError)?;

    key.zeroize();
    Ok(decipher_data)
}

/// Encrypts data under a key stretched from the passphrase with Argon2id.
///
/// Layout of the returned buffer: `ciphertext || nonce(24) || salt(32)`,
/// where the ciphertext carries the 16-byte Poly1305 tag.
pub fn encrypt_data(passphrase: &str, data: &[u8]) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut key = derive_key(passphrase.as_bytes(), &salt)?;

    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let encryptor = XChaCha20Poly1305::new(&key.into());
    let mut cipher_data = encryptor
        .encrypt(&nonce, data)
        .map_err(CryptoError::EncryptionError)?;
    cipher_data.extend_from_slice(&nonce);
    cipher_data.extend_from_slice(&salt);

    key.zeroize();
    salt.zeroize();

    Ok(cipher_data)
}

fn secure_argon<'key>() -> Result<Argon2<'key>> {
    let params = ParamsBuilder::default()
        .t_cost(10)
        .output_len(32)
        .build()
        .map_err(CryptoError::KeyDerivationParamError)?;

    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

fn derive_key(passphrase: &[u8], salt: &[u8]) -> Result<[u8; 32]> {
    let mut output_key_material = [0u8; 32];
    secure_argon()?
        .hash_password_into(passphrase, salt, &mut output_key_material)
        .map_err(CryptoError::KeyDerivationError)?;

    Ok(output_key_material)
}

/// Deterministic pseudo-random stream seeded from a passphrase.
///
/// The seed is the sum of the passphrase's unicode scalar values. That
/// derivation is weak on purpose: it matches the scheme existing carriers
/// were written with, and it only keys the position shuffle and the
/// keystream pad, both of which sit underneath real encryption. See the
/// weak-seed note in DESIGN.md before changing it.
#[derive(Debug)]
pub struct ShuffleSource {
    rng: fastrand::Rng,
}

impl ShuffleSource {
    pub fn from_passphrase(passphrase: &str) -> Self {
        let seed = passphrase.chars().map(|c| c as u64).sum::<u64>();
        log::trace!("shuffle seed derived from passphrase: {seed}");
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Next keystream byte.
    pub fn next_byte(&mut self) -> u8 {
        self.rng.u8(..)
    }

    /// Next four keystream bytes as a little-endian u32.
    pub fn next_u32(&mut self) -> u32 {
        u32::from_le_bytes([
            self.next_byte(),
            self.next_byte(),
            self.next_byte(),
            self.next_byte(),
        ])
    }

    /// In-place Fisher-Yates shuffle driven by this stream.
    pub fn shuffle<T>(&mut self, data: &mut [T]) {
        for i in (1..data.len()).rev() {
            let j = self.rng.usize(0..=i);
            data.swap(i, j);
        }
    }
}
