//! Cryptographic types and operations on them

mod asymmetric_key;
mod error;

pub use asymmetric_key::{sign, verify, PublicKey, SecretKey, Signature};
pub use error::Error;
