// Wallet - a key pair plus a view over the outputs it owns

use crate::core::{Amount, KeyPair, Transaction, TxOutput};
use crate::storage::UtxoSet;
use crate::wallet::TransactionBuilder;
use secp256k1::PublicKey;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("value {value} is below the minimum of {minimum}")]
    BelowMinimum { value: Amount, minimum: Amount },
    #[error("insufficient funds: have {available}, need {required}")]
    InsufficientFunds { available: Amount, required: Amount },
}

pub struct Wallet {
    keys: KeyPair,
}

impl Wallet {
    /// Create a wallet with a freshly generated key pair
    pub fn new() -> Self {
        Self {
            keys: KeyPair::generate(),
        }
    }

    pub fn from_keys(keys: KeyPair) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &KeyPair {
        &self.keys
    }

    pub fn public_key(&self) -> PublicKey {
        self.keys.public_key
    }

    /// Outputs in `utxo_set` this wallet can spend
    pub fn owned_outputs(&self, utxo_set: &UtxoSet) -> Vec<TxOutput> {
        TransactionBuilder::new(utxo_set).owned_outputs(&self.keys.public_key)
    }

    pub fn balance(&self, utxo_set: &UtxoSet) -> Amount {
        utxo_set.balance_of(&self.keys.public_key)
    }

    /// Build and sign a payment, refusing values below `minimum` or above the balance
    pub fn send_funds(
        &self,
        recipient: &PublicKey,
        value: Amount,
        utxo_set: &UtxoSet,
        minimum: Amount,
    ) -> Result<Transaction, WalletError> {
        if value < minimum {
            log::warn!("Transaction value below minimum, discarded");
            return Err(WalletError::BelowMinimum { value, minimum });
        }

        let available = self.balance(utxo_set);
        if available < value {
            log::warn!("Not enough funds to send transaction, discarded");
            return Err(WalletError::InsufficientFunds {
                available,
                required: value,
            });
        }

        Ok(TransactionBuilder::new(utxo_set).build(&self.keys, recipient, value))
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}
