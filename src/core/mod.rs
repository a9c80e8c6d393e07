// Core ledger data structures

mod types;
mod hash;
mod merkle;
mod transaction;
mod block;
pub mod signature;

pub use types::*;
pub use hash::*;
pub use merkle::compute_root;
pub use transaction::*;
pub use block::*;
pub use signature::{encode_key, KeyPair, SignatureError};
