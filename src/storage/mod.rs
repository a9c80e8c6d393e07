// In-memory ledger state: the UTXO set and the chain that owns it

mod utxo_set;
mod ledger;

pub use utxo_set::UtxoSet;
pub use ledger::{Ledger, LedgerError};
