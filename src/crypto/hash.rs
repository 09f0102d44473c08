//! SHA-256 hashing utilities
//!
//! Used to check compiler downloads against the checksums published in the
//! Solidity release list.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Checks `data` against an expected hex digest.
/// Accepts an optional `0x` prefix and either letter case.
pub fn verify_sha256(data: &[u8], expected_hex: &str) -> bool {
    let expected = expected_hex.trim();
    let expected = expected
        .strip_prefix("0x")
        .or_else(|| expected.strip_prefix("0X"))
        .unwrap_or(expected);
    sha256_hex(data).eq_ignore_ascii_case(expected)
}
