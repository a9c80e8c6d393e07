// Wallet and transaction building

mod wallet;
mod tx_builder;

pub use wallet::{Wallet, WalletError};
pub use tx_builder::TransactionBuilder;
