use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    /// The ciphertext is shorter than the appended nonce and salt.
    #[error("Cipher data is too short")]
    CipherDataTooShort,

    #[error("Key derivation failed")]
    KeyDerivationError(argon2::Error),

    #[error("Invalid key derivation parameters")]
    KeyDerivationParamError(argon2::Error),

    #[error("Encryption failed")]
    EncryptionError(chacha20poly1305::Error),

    /// Authentication failed. Deliberately carries no detail: a wrong
    /// passphrase and corrupted data are indistinguishable by design.
    #[error("Decryption failed")]
    DecryptionError(chacha20poly1305::Error),
}
