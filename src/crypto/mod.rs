//! Cryptographic utilities
//!
//! Transaction signing lives with the wallet (secp256k1 via alloy). This
//! module only covers the SHA-256 digests used to verify downloaded
//! compiler binaries.

pub mod hash;

pub use hash::{sha256, sha256_hex, verify_sha256};
