// Hashing utilities

use sha2::{Sha256, Digest};
use crate::core::Hash;

/// SHA-256 rendered as lowercase hex (64 characters)
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Raw SHA-256 digest, used as the ECDSA message
pub fn sha256_digest(data: &[u8]) -> [u8; 32] {
    let hash = Sha256::digest(data);
    let mut result = [0u8; 32];
    result.copy_from_slice(&hash);
    result
}

/// Hash a string payload into a ledger Hash
pub fn hash_str(data: &str) -> Hash {
    Hash::from_hex(sha256_hex(data.as_bytes()))
}
