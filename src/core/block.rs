// Block data structures

use crate::consensus::{CancelToken, Miner, MiningResult};
use crate::core::{compute_root, hash_str, Hash, ProcessContext, Transaction};
use std::time::{SystemTime, UNIX_EPOCH};

/// Block - hash-linked container of transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub hash: Hash,
    /// Hash of the previous block ("0" for genesis)
    pub prev_hash: Hash,
    /// Creation time, milliseconds since the Unix epoch
    pub timestamp: u64,
    /// Nonce for proof-of-work
    pub nonce: u64,
    /// Merkle root of the transaction ids, set when mining
    pub merkle_root: Hash,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Create a new block on top of `prev_hash`
    pub fn new(prev_hash: Hash) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self::with_timestamp(prev_hash, timestamp)
    }

    /// Create a block with an explicit timestamp
    pub fn with_timestamp(prev_hash: Hash, timestamp: u64) -> Self {
        let mut block = Self {
            hash: Hash::empty(),
            prev_hash,
            timestamp,
            nonce: 0,
            merkle_root: Hash::empty(),
            transactions: Vec::new(),
        };
        block.hash = block.calculate_hash();
        block
    }

    /// Hash of the header fields, without touching the block
    pub fn hash_fields(prev_hash: &Hash, timestamp: u64, nonce: u64, merkle_root: &Hash) -> Hash {
        hash_str(&format!("{}{}{}{}", prev_hash, timestamp, nonce, merkle_root))
    }

    pub fn calculate_hash(&self) -> Hash {
        Self::hash_fields(&self.prev_hash, self.timestamp, self.nonce, &self.merkle_root)
    }

    /// Ids of the contained transactions, in order
    pub fn transaction_ids(&self) -> Vec<Hash> {
        self.transactions
            .iter()
            .map(|tx| tx.id.clone().unwrap_or_else(Hash::empty))
            .collect()
    }

    /// Merkle root recomputed from the current transactions
    pub fn calculate_merkle_root(&self) -> Hash {
        compute_root(&self.transaction_ids())
    }

    /// Check if this is the genesis block
    pub fn is_genesis(&self) -> bool {
        self.prev_hash == Hash::genesis_sentinel()
    }

    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        self.hash.has_leading_zeros(difficulty)
    }

    /// Mine until the hash has `difficulty` leading zeros
    pub fn mine(&mut self, difficulty: usize) -> MiningResult {
        Miner::new(difficulty).mine(self)
    }

    /// Mine, giving up when `cancel` is triggered
    pub fn mine_with_cancel(&mut self, difficulty: usize, cancel: &CancelToken) -> MiningResult {
        Miner::new(difficulty).with_cancel(cancel.clone()).mine(self)
    }

    /// Process a transaction against the live UTXO set and add it.
    ///
    /// `None` (a transaction the wallet refused to build) is rejected. Genesis
    /// blocks take their coinbase as-is. Returns false when the transaction
    /// was discarded.
    pub fn add_transaction(&mut self, tx: Option<Transaction>, ctx: &mut ProcessContext<'_>) -> bool {
        let Some(mut tx) = tx else {
            log::warn!("No transaction to add");
            return false;
        };

        if !self.is_genesis() {
            if let Err(e) = tx.process(ctx) {
                log::warn!("Transaction failed to process, discarded: {}", e);
                return false;
            }
        }

        self.transactions.push(tx);
        log::debug!("Transaction added to block ({} total)", self.transactions.len());
        true
    }
}
