//! Asymmetric key types and methods on them

use std::{
    cmp::Ordering,
    convert::TryFrom,
    fmt::{self, Debug, Display, Formatter},
    hash::{Hash, Hasher},
};

use datasize::DataSize;
use ed25519_dalek::{
    Signature as Ed25519Signature, Signer, SigningKey as Ed25519SecretKey,
    VerifyingKey as Ed25519PublicKey, PUBLIC_KEY_LENGTH as ED25519_PUBLIC_KEY_LENGTH,
    SECRET_KEY_LENGTH as ED25519_SECRET_KEY_LENGTH, SIGNATURE_LENGTH as ED25519_SIGNATURE_LENGTH,
};
use hex_fmt::HexFmt;
#[cfg(any(feature = "testing", test))]
use rand::RngCore;
use serde::{de::Error as SerdeError, Deserialize, Deserializer, Serialize, Serializer};

use super::Error;
#[cfg(any(feature = "testing", test))]
use crate::testing::TestRng;

/// An Ed25519 secret key.
pub struct SecretKey(Ed25519SecretKey);

impl SecretKey {
    /// The length in bytes of an Ed25519 secret key.
    pub const LENGTH: usize = ED25519_SECRET_KEY_LENGTH;

    /// Constructs a secret key from raw bytes.
    pub fn from_bytes(bytes: [u8; Self::LENGTH]) -> Self {
        SecretKey(Ed25519SecretKey::from_bytes(&bytes))
    }

    /// Generates a random instance using a `TestRng`.
    #[cfg(any(feature = "testing", test))]
    pub fn random(rng: &mut TestRng) -> Self {
        let mut bytes = [0u8; Self::LENGTH];
        rng.fill_bytes(&mut bytes[..]);
        SecretKey::from_bytes(bytes)
    }
}

impl Debug for SecretKey {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "SecretKey::Ed25519(..)")
    }
}

impl Display for SecretKey {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        Debug::fmt(self, formatter)
    }
}

/// An Ed25519 public key.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct PublicKey(Ed25519PublicKey);

impl PublicKey {
    /// The length in bytes of an Ed25519 public key.
    pub const LENGTH: usize = ED25519_PUBLIC_KEY_LENGTH;

    /// Constructs a public key from raw bytes, checking that they describe a curve point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let raw = <[u8; Self::LENGTH]>::try_from(bytes).map_err(|_| {
            Error::AsymmetricKey(format!(
                "expected {} bytes for an Ed25519 public key, got {}",
                Self::LENGTH,
                bytes.len()
            ))
        })?;
        Ed25519PublicKey::from_bytes(&raw)
            .map(PublicKey)
            .map_err(|error| Error::AsymmetricKey(format!("invalid Ed25519 public key: {}", error)))
    }

    /// Returns the raw bytes of the key.
    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        self.0.as_bytes()
    }

    /// Returns the key as an upper-case hex string.
    pub fn to_hex(&self) -> String {
        base16::encode_upper(self.as_bytes())
    }

    /// Parses a key from its hex representation.
    pub fn from_hex<T: AsRef<[u8]>>(input: T) -> Result<Self, Error> {
        let bytes = hex::decode(input)?;
        Self::from_bytes(&bytes)
    }

    /// Generates a random instance using a `TestRng`.
    #[cfg(any(feature = "testing", test))]
    pub fn random(rng: &mut TestRng) -> Self {
        PublicKey::from(&SecretKey::random(rng))
    }
}

impl From<&SecretKey> for PublicKey {
    fn from(secret_key: &SecretKey) -> PublicKey {
        PublicKey(secret_key.0.verifying_key())
    }
}

impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// `ed25519_dalek::VerifyingKey`'s own `Hash` is not guaranteed to match `Ord`.
impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl Debug for PublicKey {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "PublicKey::Ed25519({})", HexFmt(self.as_bytes()))
    }
}

impl Display for PublicKey {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "Key::Ed25519({:10})", HexFmt(self.as_bytes()))
    }
}

impl DataSize for PublicKey {
    const IS_DYNAMIC: bool = false;
    const STATIC_HEAP_SIZE: usize = 0;

    fn estimate_heap_size(&self) -> usize {
        0
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_bytes(self.as_bytes(), serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = deserialize_bytes(deserializer)?;
        PublicKey::from_bytes(&bytes).map_err(SerdeError::custom)
    }
}

/// An Ed25519 signature.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Signature([u8; ED25519_SIGNATURE_LENGTH]);

impl Signature {
    /// The length in bytes of an Ed25519 signature.
    pub const LENGTH: usize = ED25519_SIGNATURE_LENGTH;

    /// Constructs a signature from raw bytes.
    ///
    /// Whether the bytes form a valid signature is only established by [`verify`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        <[u8; Self::LENGTH]>::try_from(bytes)
            .map(Signature)
            .map_err(|_| {
                Error::AsymmetricKey(format!(
                    "expected {} bytes for an Ed25519 signature, got {}",
                    Self::LENGTH,
                    bytes.len()
                ))
            })
    }

    /// Returns the raw bytes of the signature.
    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }
}

impl Debug for Signature {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "Signature::Ed25519({})", HexFmt(&self.0[..]))
    }
}

impl Display for Signature {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "Sig::Ed25519({:10})", HexFmt(&self.0[..]))
    }
}

impl DataSize for Signature {
    const IS_DYNAMIC: bool = false;
    const STATIC_HEAP_SIZE: usize = 0;

    fn estimate_heap_size(&self) -> usize {
        0
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_bytes(&self.0[..], serializer)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = deserialize_bytes(deserializer)?;
        Signature::from_bytes(&bytes).map_err(SerdeError::custom)
    }
}

fn serialize_bytes<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    if serializer.is_human_readable() {
        base16::encode_lower(bytes).serialize(serializer)
    } else {
        serializer.serialize_bytes(bytes)
    }
}

fn deserialize_bytes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    if deserializer.is_human_readable() {
        let hex_string = String::deserialize(deserializer)?;
        hex::decode(hex_string).map_err(SerdeError::custom)
    } else {
        Vec::<u8>::deserialize(deserializer)
    }
}

/// Signs the given message using the given key.
pub fn sign<T: AsRef<[u8]>>(message: T, secret_key: &SecretKey) -> Signature {
    let signature: Ed25519Signature = secret_key.0.sign(message.as_ref());
    Signature(signature.to_bytes())
}

/// Verifies the signature of the given message against the given public key.
pub fn verify<T: AsRef<[u8]>>(
    message: T,
    signature: &Signature,
    public_key: &PublicKey,
) -> Result<(), Error> {
    let signature = Ed25519Signature::from_bytes(&signature.0);
    public_key
        .0
        .verify_strict(message.as_ref(), &signature)
        .map_err(|_| Error::SignatureVerification)
}
