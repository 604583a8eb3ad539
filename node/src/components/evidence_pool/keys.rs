//! Layout of the pending and committed namespaces.
//!
//! A key is the namespace prefix, the evidence height as 16 zero-padded upper-case hex digits, a
//! `/` and the upper-case hex evidence hash. The fixed-width height makes lexical key order equal
//! ascending height order.

use bincode::Options;

use evidence_types::Evidence;

/// Prefix of pending evidence keys.
pub(super) const PENDING_PREFIX: &[u8] = b"evidence-pending";
/// Prefix of committed evidence keys.
pub(super) const COMMITTED_PREFIX: &[u8] = b"evidence-committed";

/// Returns the key of `evidence` in the pending namespace.
pub(super) fn pending_key(evidence: &Evidence) -> Vec<u8> {
    key(PENDING_PREFIX, evidence)
}

/// Returns the key of `evidence` in the committed namespace.
pub(super) fn committed_key(evidence: &Evidence) -> Vec<u8> {
    key(COMMITTED_PREFIX, evidence)
}

fn key(prefix: &[u8], evidence: &Evidence) -> Vec<u8> {
    let suffix = format!("{:016X}/{:X}", evidence.height(), evidence.hash());
    let mut key = Vec::with_capacity(prefix.len() + suffix.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(suffix.as_bytes());
    key
}

/// Encodes the value of a committed marker: the height as a bincode varint.
///
/// Heights below 251 take a single byte, larger ones a `0xFB`..`0xFD` tag followed by a
/// little-endian `u16`, `u32` or `u64`.
pub(super) fn encode_committed_height(height: u64) -> Result<Vec<u8>, bincode::Error> {
    bincode::DefaultOptions::new()
        .with_varint_encoding()
        .serialize(&height)
}

/// Decodes the value of a committed marker.
pub(super) fn decode_committed_height(bytes: &[u8]) -> Result<u64, bincode::Error> {
    bincode::DefaultOptions::new()
        .with_varint_encoding()
        .deserialize(bytes)
}
