// media-core/src/core/hashing.rs
// ============================================================================
// Module: Canonical Hashing
// Description: RFC 8785 JSON canonicalization plus digest helpers.
// Purpose: Deterministic content fingerprints for dedupe and snapshotting.
// Dependencies: serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Raw provider payloads and compiled query definitions are hashed after
//! canonicalization so that semantically identical JSON always yields the
//! same digest regardless of key order or whitespace.

use serde::Serialize;
use serde_json::Error as JsonError;
use sha2::Digest;
use sha2::Sha256;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256, the only algorithm currently supported.
    Sha256,
}

/// The default algorithm used when none is specified.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// A digest tagged with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct HashDigest {
    /// Algorithm used to produce `value`.
    pub algorithm: HashAlgorithm,
    /// Lower-case hex-encoded digest.
    pub value: String,
}

/// Serializes `value` to RFC 8785 canonical JSON bytes.
///
/// # Errors
///
/// Returns a `serde_json::Error` when `value` cannot be serialized.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, JsonError> {
    serde_jcs::to_vec(value)
}

/// Hashes the canonical JSON form of `value`.
///
/// # Errors
///
/// Returns a `serde_json::Error` when `value` cannot be serialized.
pub fn hash_canonical_json<T: Serialize>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<HashDigest, JsonError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(algorithm, &bytes))
}

/// Hashes raw bytes under the given algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            let digest = hasher.finalize();
            HashDigest {
                algorithm,
                value: hex_encode(&digest),
            }
        }
    }
}

/// Lowercase hex encoding of `bytes`.
fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions."
)]
mod tests {
    use super::HashAlgorithm;
    use super::hash_bytes;
    use super::hash_canonical_json;
    use serde_json::json;

    #[test]
    fn canonical_json_is_stable_under_key_reordering() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        let digest_a = hash_canonical_json(HashAlgorithm::Sha256, &a).unwrap();
        let digest_b = hash_canonical_json(HashAlgorithm::Sha256, &b).unwrap();
        assert_eq!(digest_a, digest_b);
    }

    #[test]
    fn hash_bytes_is_deterministic() {
        let first = hash_bytes(HashAlgorithm::Sha256, b"payload");
        let second = hash_bytes(HashAlgorithm::Sha256, b"payload");
        assert_eq!(first, second);
        assert_eq!(first.value.len(), 64);
    }
}
