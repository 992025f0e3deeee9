use thiserror::Error;

pub use stegokit_crypto::CryptoError;

#[derive(Error, Debug)]
pub enum StegoError {
    /// The carrier cannot be processed by any embedding method, for
    /// example a non-image file, a multi-frame GIF or a palette with
    /// duplicate colors.
    #[error("Carrier format is not supported")]
    UnsupportedFormat,

    /// The serialized and encrypted payload does not fit the carrier.
    /// Raised before any carrier data is touched.
    #[error("Payload needs {required} bytes but the carrier can hold {available}")]
    InsufficientCapacity { required: usize, available: usize },

    /// Extraction did not terminate with a well-formed payload frame.
    /// Covers both a wrong passphrase and a damaged carrier; the two are
    /// deliberately not distinguished.
    #[error("Wrong key or corrupted carrier")]
    KeyOrCorruption,

    /// The operation was cancelled cooperatively; the carrier is untouched.
    #[error("Operation cancelled")]
    Cancelled,

    /// A payload file has an empty or non-representable name.
    #[error("A file with an invalid file name was provided")]
    InvalidFileName,

    /// Represents a failure to read the carrier or payload input.
    #[error("Read error")]
    ReadError { source: std::io::Error },

    /// Represents a failure to write the output carrier or payload files.
    #[error("Write error")]
    WriteError { source: std::io::Error },

    /// Represents all other cases of `std::io::Error`.
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// Encrypting the payload failed. Distinct from [`Self::KeyOrCorruption`]:
    /// this can only happen on the embedding side.
    #[error("Encryption error")]
    EncryptionError(CryptoError),
}

pub type Result<T> = std::result::Result<T, StegoError>;
