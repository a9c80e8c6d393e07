// Transaction data structures and UTXO processing

use crate::core::{encode_key, hash_str, signature, Amount, Hash};
use crate::storage::UtxoSet;
use secp256k1::{PublicKey, SecretKey};
use std::collections::HashSet;
use thiserror::Error;

/// Why a transaction was refused during processing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    #[error("transaction signature failed to verify")]
    InvalidSignature,
    #[error("referenced output {0} is not in the UTXO set")]
    MissingUtxo(Hash),
    #[error("inputs total {total} is below the minimum of {minimum}")]
    BelowMinimum { total: Amount, minimum: Amount },
    #[error("inputs total {total} cannot cover value {value}")]
    InsufficientInputs { total: Amount, value: Amount },
}

/// Transaction output - an amount owned by a public key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    /// hash(owner ∥ value ∥ origin_tx_id)
    pub id: Hash,
    /// Who may spend this output
    pub owner: PublicKey,
    pub value: Amount,
    /// Transaction that created this output
    pub origin_tx_id: Hash,
}

impl TxOutput {
    pub fn new(owner: PublicKey, value: Amount, origin_tx_id: Hash) -> Self {
        let id = hash_str(&format!("{}{}{}", encode_key(&owner), value, origin_tx_id));
        Self {
            id,
            owner,
            value,
            origin_tx_id,
        }
    }

    /// Check if this output belongs to the given key
    pub fn is_mine(&self, public_key: &PublicKey) -> bool {
        &self.owner == public_key
    }
}

/// Transaction input - references an unspent output by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    pub output_id: Hash,
    /// Value of the referenced output, recorded when the input is resolved
    pub claimed_value: Option<Amount>,
}

impl TxInput {
    pub fn new(output_id: Hash) -> Self {
        Self {
            output_id,
            claimed_value: None,
        }
    }
}

/// Allocates the sequence numbers mixed into transaction ids
#[derive(Debug, Clone, Default)]
pub struct TxSequence {
    last: u64,
}

impl TxSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

/// Mutable state a transaction needs while it is processed
pub struct ProcessContext<'a> {
    pub utxo_set: &'a mut UtxoSet,
    pub sequence: &'a mut TxSequence,
    pub minimum_value: Amount,
}

/// Transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Assigned on successful processing
    pub id: Option<Hash>,
    pub sender: PublicKey,
    pub recipient: PublicKey,
    pub value: Amount,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    /// DER-encoded ECDSA signature over (sender, recipient, value)
    pub signature: Vec<u8>,
}

impl Transaction {
    /// Create a new unsigned transaction
    pub fn new(sender: PublicKey, recipient: PublicKey, value: Amount, inputs: Vec<TxInput>) -> Self {
        Self {
            id: None,
            sender,
            recipient,
            value,
            inputs,
            outputs: Vec::new(),
            signature: Vec::new(),
        }
    }

    /// Create a coinbase transaction (no inputs)
    pub fn coinbase(sender: PublicKey, recipient: PublicKey, value: Amount) -> Self {
        Self::new(sender, recipient, value, Vec::new())
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    /// The signed payload. Inputs, outputs and id are not part of it.
    fn signing_payload(&self) -> String {
        format!("{}{}{}", encode_key(&self.sender), encode_key(&self.recipient), self.value)
    }

    pub fn sign(&mut self, secret_key: &SecretKey) {
        self.signature = signature::sign(secret_key, self.signing_payload().as_bytes());
    }

    pub fn verify_signature(&self) -> bool {
        signature::verify(&self.sender, self.signing_payload().as_bytes(), &self.signature)
    }

    /// Give a genesis coinbase the sentinel id and its single output.
    /// The caller is responsible for seeding the output into the UTXO set.
    pub fn assign_genesis_id(&mut self) -> &TxOutput {
        let id = Hash::genesis_sentinel();
        self.outputs = vec![TxOutput::new(self.recipient, self.value, id.clone())];
        self.id = Some(id);
        &self.outputs[0]
    }

    /// Verify, resolve inputs, and spend them into new outputs.
    ///
    /// All checks run before the UTXO set is touched, so a failure leaves it
    /// exactly as it was.
    pub fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), TxError> {
        if !self.verify_signature() {
            return Err(TxError::InvalidSignature);
        }

        // Resolve every input against the live set
        let mut resolved = Vec::with_capacity(self.inputs.len());
        let mut seen = HashSet::with_capacity(self.inputs.len());
        for input in &self.inputs {
            // A second reference to the same output would be a double-spend
            if !seen.insert(&input.output_id) {
                return Err(TxError::MissingUtxo(input.output_id.clone()));
            }
            let output = ctx
                .utxo_set
                .get(&input.output_id)
                .ok_or_else(|| TxError::MissingUtxo(input.output_id.clone()))?;
            resolved.push(output.value);
        }

        let total: Amount = resolved.iter().sum();
        if total < ctx.minimum_value {
            return Err(TxError::BelowMinimum {
                total,
                minimum: ctx.minimum_value,
            });
        }
        if total < self.value {
            return Err(TxError::InsufficientInputs {
                total,
                value: self.value,
            });
        }

        let change = total - self.value;
        let id = hash_str(&format!("{}{}", self.signing_payload(), ctx.sequence.allocate()));

        let mut outputs = vec![TxOutput::new(self.recipient, self.value, id.clone())];
        if change > 0 {
            outputs.push(TxOutput::new(self.sender, change, id.clone()));
        }

        // Spend: produce new outputs, then consume inputs
        for output in &outputs {
            ctx.utxo_set.put(output.clone());
        }
        for (input, value) in self.inputs.iter_mut().zip(resolved) {
            input.claimed_value = Some(value);
            ctx.utxo_set.remove(&input.output_id);
        }

        log::debug!("Processed transaction {} ({} in, {} out)", id, total, self.value);

        self.outputs = outputs;
        self.id = Some(id);
        Ok(())
    }

    /// Sum of the values claimed by the inputs
    pub fn inputs_value(&self) -> Amount {
        self.inputs.iter().filter_map(|input| input.claimed_value).sum()
    }

    /// Calculate total output value
    pub fn outputs_value(&self) -> Amount {
        self.outputs.iter().map(|out| out.value).sum()
    }
}
