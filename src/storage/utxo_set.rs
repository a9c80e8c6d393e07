// UTXO (Unspent Transaction Output) set management

use crate::core::{Amount, Hash, TxOutput};
use secp256k1::PublicKey;
use std::collections::BTreeMap;

/// In-memory UTXO set, keyed by output id.
///
/// Ordered so that wallet views and coin selection are deterministic.
/// There is no internal locking: whoever holds `&mut UtxoSet` is the single
/// writer.
#[derive(Debug, Clone, Default)]
pub struct UtxoSet {
    outputs: BTreeMap<Hash, TxOutput>,
}

impl UtxoSet {
    /// Create an empty UTXO set
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a UTXO
    pub fn get(&self, id: &Hash) -> Option<&TxOutput> {
        self.outputs.get(id)
    }

    /// Add a UTXO, replacing any entry with the same id
    pub fn put(&mut self, output: TxOutput) {
        self.outputs.insert(output.id.clone(), output);
    }

    /// Remove a UTXO (spent)
    pub fn remove(&mut self, id: &Hash) -> Option<TxOutput> {
        self.outputs.remove(id)
    }

    /// Check if a UTXO exists
    pub fn contains(&self, id: &Hash) -> bool {
        self.outputs.contains_key(id)
    }

    /// Count total UTXOs
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TxOutput> {
        self.outputs.values()
    }

    /// Read-only view of the outputs owned by a public key
    pub fn owned_by<'a>(&'a self, owner: &'a PublicKey) -> impl Iterator<Item = &'a TxOutput> + 'a {
        self.outputs.values().filter(move |output| output.is_mine(owner))
    }

    /// Get balance for a public key
    pub fn balance_of(&self, owner: &PublicKey) -> Amount {
        self.owned_by(owner).map(|output| output.value).sum()
    }
}
