use hex::FromHexError;
use thiserror::Error;

/// Cryptographic errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Error resulting from creating or using asymmetric key types.
    #[error("asymmetric key error: {0}")]
    AsymmetricKey(String),

    /// Error resulting when decoding a type from a hex-encoded representation.
    #[error("decoding from hex: {0}")]
    FromHex(String),

    /// Signature verification failed.
    #[error("failed to verify Ed25519 signature")]
    SignatureVerification,
}

impl From<FromHexError> for Error {
    fn from(error: FromHexError) -> Self {
        Error::FromHex(error.to_string())
    }
}
