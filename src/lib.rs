// UTXO Ledger - educational single-process blockchain

pub mod core;
pub mod consensus;
pub mod storage;
pub mod wallet;
pub mod config;
pub mod cli;

// Re-exports for convenience
pub use core::{Amount, Block, Hash, KeyPair, Transaction, TxInput, TxOutput, COIN};
pub use consensus::{CancelToken, ChainValidator, Miner, ValidationError};
pub use storage::{Ledger, LedgerError, UtxoSet};
pub use wallet::{TransactionBuilder, Wallet, WalletError};
pub use config::{ConfigError, LedgerConfig};
pub use cli::{Cli, CliHandler};
