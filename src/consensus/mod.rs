// Proof-of-work and chain validation

pub mod pow;
pub mod validation;

pub use pow::{meets_difficulty, CancelToken, Miner, MiningResult, MAX_DIFFICULTY};
pub use validation::{ChainValidator, ValidationError};
