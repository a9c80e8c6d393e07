// Basic types for the ledger

use std::fmt;

/// Value in base units. 1 coin = 100,000,000 base units.
pub type Amount = u64;

/// Number of base units in one coin
pub const COIN: Amount = 100_000_000;

/// Render an amount as coins with eight decimal places
pub fn format_amount(value: Amount) -> String {
    format!("{}.{:08}", value / COIN, value % COIN)
}

/// Hex-encoded SHA-256 digest.
/// Used for block hashes, transaction IDs, output IDs and Merkle roots.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash(String);

impl Hash {
    /// Wrap an already hex-encoded digest
    pub fn from_hex(hex_str: impl Into<String>) -> Self {
        Self(hex_str.into())
    }

    /// Sentinel used as the genesis block's prev_hash and the genesis transaction id
    pub fn genesis_sentinel() -> Self {
        Self("0".to_string())
    }

    /// Root of an empty transaction list
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if the first `count` hex characters are all '0'
    pub fn has_leading_zeros(&self, count: usize) -> bool {
        self.0.len() >= count && self.0.bytes().take(count).all(|b| b == b'0')
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
