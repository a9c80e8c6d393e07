// Proof of Work implementation

use crate::core::{Block, Hash};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How many nonces are tried between cancellation checks
pub const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Longest leading-zero prefix a hex SHA-256 hash can have
pub const MAX_DIFFICULTY: usize = 64;

/// Shared flag that aborts an in-progress search
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Check if a hash has `difficulty` leading '0' characters
pub fn meets_difficulty(hash: &Hash, difficulty: usize) -> bool {
    hash.has_leading_zeros(difficulty)
}

/// Proof of Work miner
pub struct Miner {
    /// Required number of leading zero hex characters
    pub difficulty: usize,
    cancel: Option<CancelToken>,
}

impl Miner {
    /// Create a new miner with fixed difficulty
    pub fn new(difficulty: usize) -> Self {
        Self {
            difficulty,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Mine a block by finding a valid nonce.
    ///
    /// Recomputes the Merkle root, then searches nonces from the block's
    /// current nonce upwards. The block is only modified once a nonce is
    /// found; a cancelled or exhausted search leaves it untouched.
    pub fn mine(&self, block: &mut Block) -> MiningResult {
        let start_time = Instant::now();
        let merkle_root = block.calculate_merkle_root();
        let mut attempts = 0u64;

        if self.difficulty > MAX_DIFFICULTY {
            log::warn!("Difficulty {} can never be met", self.difficulty);
            return MiningResult::failed(false, attempts, start_time.elapsed());
        }

        for nonce in block.nonce..=u64::MAX {
            if attempts % CANCEL_CHECK_INTERVAL == 0
                && self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
            {
                log::info!("Mining cancelled after {} attempts", attempts);
                return MiningResult::failed(true, attempts, start_time.elapsed());
            }

            let hash = Block::hash_fields(&block.prev_hash, block.timestamp, nonce, &merkle_root);
            attempts += 1;

            if meets_difficulty(&hash, self.difficulty) {
                let duration = start_time.elapsed();
                log::info!("Block mined: {} (nonce {}, {} attempts)", hash, nonce, attempts);

                block.merkle_root = merkle_root;
                block.nonce = nonce;
                block.hash = hash.clone();

                return MiningResult {
                    success: true,
                    cancelled: false,
                    nonce,
                    hash,
                    attempts,
                    duration,
                };
            }

            // Progress indicator every 100k attempts
            if attempts % 100_000 == 0 {
                let elapsed = start_time.elapsed();
                log::debug!("Mining attempts: {} ({:.1} KH/s)",
                    attempts,
                    attempts as f64 / elapsed.as_secs_f64() / 1000.0
                );
            }
        }

        MiningResult::failed(false, attempts, start_time.elapsed())
    }

    /// Verify that a block's stored hash satisfies PoW
    pub fn verify(&self, block: &Block) -> bool {
        meets_difficulty(&block.hash, self.difficulty)
    }
}

/// Mining result
#[derive(Debug)]
pub struct MiningResult {
    /// Whether a valid nonce was found
    pub success: bool,
    /// Whether the search stopped because of a cancel request
    pub cancelled: bool,
    /// The nonce that was found
    pub nonce: u64,
    /// The resulting hash
    pub hash: Hash,
    /// Number of attempts
    pub attempts: u64,
    /// Time taken
    pub duration: Duration,
}

impl MiningResult {
    fn failed(cancelled: bool, attempts: u64, duration: Duration) -> Self {
        Self {
            success: false,
            cancelled,
            nonce: 0,
            hash: Hash::empty(),
            attempts,
            duration,
        }
    }

    /// Calculate hash rate (hashes per second)
    pub fn hash_rate(&self) -> f64 {
        self.attempts as f64 / self.duration.as_secs_f64()
    }
}
