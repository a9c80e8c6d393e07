// Transaction builder

use crate::core::{Amount, KeyPair, Transaction, TxInput, TxOutput};
use crate::storage::UtxoSet;
use secp256k1::PublicKey;

/// Builds transactions from a read-only view of the UTXO set
pub struct TransactionBuilder<'a> {
    utxo_set: &'a UtxoSet,
}

impl<'a> TransactionBuilder<'a> {
    /// Create a new transaction builder
    pub fn new(utxo_set: &'a UtxoSet) -> Self {
        Self { utxo_set }
    }

    /// Outputs currently owned by `owner`
    pub fn owned_outputs(&self, owner: &PublicKey) -> Vec<TxOutput> {
        self.utxo_set.owned_by(owner).cloned().collect()
    }

    pub fn sum_value(outputs: &[TxOutput]) -> Amount {
        outputs.iter().map(|output| output.value).sum()
    }

    /// Build an unsigned transaction spending from `owned`.
    ///
    /// Outputs are taken in order until they cover `value`. If they never do,
    /// every owned output is referenced and processing will refuse it.
    pub fn create_transaction(
        sender: &PublicKey,
        recipient: &PublicKey,
        value: Amount,
        owned: &[TxOutput],
    ) -> Transaction {
        let mut inputs = Vec::new();
        let mut total = 0u64;

        for output in owned {
            inputs.push(TxInput::new(output.id.clone()));
            total += output.value;

            if total >= value {
                break;
            }
        }

        Transaction::new(*sender, *recipient, value, inputs)
    }

    pub fn sign(tx: &mut Transaction, keypair: &KeyPair) {
        tx.sign(&keypair.secret_key);
    }

    /// Build and sign a payment from `keypair` to `recipient`
    pub fn build(&self, keypair: &KeyPair, recipient: &PublicKey, value: Amount) -> Transaction {
        let owned = self.owned_outputs(&keypair.public_key);
        let mut tx = Self::create_transaction(&keypair.public_key, recipient, value, &owned);
        Self::sign(&mut tx, keypair);
        tx
    }
}
