// Full-chain validation

use crate::consensus::pow::Miner;
use crate::core::{Amount, Block, Hash, Transaction, TxOutput};
use crate::storage::UtxoSet;
use thiserror::Error;

/// First invariant violation found while replaying the chain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("chain has no blocks")]
    EmptyChain,
    #[error("genesis output is not recorded")]
    MissingGenesisOutput,
    #[error("genesis block does not start from the sentinel hash")]
    GenesisLinkage,
    #[error("genesis block must hold exactly one coinbase transaction")]
    MalformedGenesis,
    #[error("genesis transaction does not mint the recorded genesis output")]
    GenesisOutputMismatch,
    #[error("block {block}: stored hash does not match its contents")]
    HashMismatch { block: usize },
    #[error("block {block}: previous hash does not link to the preceding block")]
    BrokenLinkage { block: usize },
    #[error("block {block}: hash does not have {difficulty} leading zeros")]
    BadProofOfWork { block: usize, difficulty: usize },
    #[error("block {block}: merkle root does not match its transactions")]
    MerkleMismatch { block: usize },
    #[error("block {block}, transaction {tx}: invalid signature")]
    InvalidSignature { block: usize, tx: usize },
    #[error("block {block}, transaction {tx}: inputs {inputs} do not equal outputs {outputs}")]
    UnbalancedTransaction { block: usize, tx: usize, inputs: Amount, outputs: Amount },
    #[error("block {block}, transaction {tx}: referenced output {output_id} is missing")]
    MissingUtxo { block: usize, tx: usize, output_id: Hash },
    #[error("block {block}, transaction {tx}: input claims {claimed:?} but output {output_id} holds {stored}")]
    ValueMismatch { block: usize, tx: usize, output_id: Hash, claimed: Option<Amount>, stored: Amount },
    #[error("block {block}, transaction {tx}: transaction was never assigned an id")]
    MissingTransactionId { block: usize, tx: usize },
    #[error("block {block}, transaction {tx}: output {output_id} does not hash from its contents")]
    ForgedOutput { block: usize, tx: usize, output_id: Hash },
    #[error("block {block}, transaction {tx}: first output is not paid to the recipient")]
    WrongRecipient { block: usize, tx: usize },
    #[error("block {block}, transaction {tx}: change output is not paid to the sender")]
    WrongChangeOwner { block: usize, tx: usize },
}

/// Replays a chain from genesis on a private UTXO set
pub struct ChainValidator {
    miner: Miner,
}

impl ChainValidator {
    /// Create a new validator with fixed difficulty
    pub fn new(difficulty: usize) -> Self {
        Self {
            miner: Miner::new(difficulty),
        }
    }

    /// Validate every block and transaction.
    ///
    /// Uses a fresh UTXO set seeded only with the genesis output, so the
    /// caller's live set is never read or written.
    pub fn validate(&self, blocks: &[Block], genesis_output: Option<&TxOutput>) -> Result<(), ValidationError> {
        let genesis = blocks.first().ok_or(ValidationError::EmptyChain)?;
        let genesis_output = genesis_output.ok_or(ValidationError::MissingGenesisOutput)?;

        self.validate_genesis(genesis, genesis_output)?;

        let mut utxos = UtxoSet::new();
        utxos.put(genesis_output.clone());

        for (index, pair) in blocks.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            self.validate_block(index + 1, current, previous, &mut utxos)?;
        }

        Ok(())
    }

    /// Genesis has no proof-of-work requirement, but its contents must still match its hash
    /// and its coinbase must mint exactly the recorded genesis output
    fn validate_genesis(&self, genesis: &Block, genesis_output: &TxOutput) -> Result<(), ValidationError> {
        if !genesis.is_genesis() {
            return Err(ValidationError::GenesisLinkage);
        }
        if genesis.hash != genesis.calculate_hash() {
            return Err(ValidationError::HashMismatch { block: 0 });
        }
        if genesis.merkle_root != genesis.calculate_merkle_root() {
            return Err(ValidationError::MerkleMismatch { block: 0 });
        }

        let [coinbase] = genesis.transactions.as_slice() else {
            return Err(ValidationError::MalformedGenesis);
        };
        if !coinbase.is_coinbase() {
            return Err(ValidationError::MalformedGenesis);
        }
        if !coinbase.verify_signature() {
            return Err(ValidationError::InvalidSignature { block: 0, tx: 0 });
        }

        let sentinel = Hash::genesis_sentinel();
        let expected = TxOutput::new(coinbase.recipient, coinbase.value, sentinel.clone());
        if coinbase.id.as_ref() != Some(&sentinel)
            || coinbase.outputs != [expected.clone()]
            || *genesis_output != expected
        {
            return Err(ValidationError::GenesisOutputMismatch);
        }
        Ok(())
    }

    /// Validate one non-genesis block and apply its transactions to `utxos`
    pub fn validate_block(
        &self,
        index: usize,
        block: &Block,
        previous: &Block,
        utxos: &mut UtxoSet,
    ) -> Result<(), ValidationError> {
        if block.hash != block.calculate_hash() {
            return Err(ValidationError::HashMismatch { block: index });
        }

        if block.prev_hash != previous.hash {
            return Err(ValidationError::BrokenLinkage { block: index });
        }

        if !self.miner.verify(block) {
            return Err(ValidationError::BadProofOfWork {
                block: index,
                difficulty: self.miner.difficulty,
            });
        }

        if block.merkle_root != block.calculate_merkle_root() {
            return Err(ValidationError::MerkleMismatch { block: index });
        }

        for (tx_index, tx) in block.transactions.iter().enumerate() {
            Self::validate_transaction(index, tx_index, tx, utxos)?;
        }

        Ok(())
    }

    /// Check one transaction against the replay set, then apply it
    fn validate_transaction(
        block: usize,
        tx_index: usize,
        tx: &Transaction,
        utxos: &mut UtxoSet,
    ) -> Result<(), ValidationError> {
        if !tx.verify_signature() {
            return Err(ValidationError::InvalidSignature { block, tx: tx_index });
        }

        let (inputs, outputs) = (tx.inputs_value(), tx.outputs_value());
        if inputs != outputs {
            return Err(ValidationError::UnbalancedTransaction {
                block,
                tx: tx_index,
                inputs,
                outputs,
            });
        }

        for input in &tx.inputs {
            let stored = utxos.remove(&input.output_id).ok_or_else(|| ValidationError::MissingUtxo {
                block,
                tx: tx_index,
                output_id: input.output_id.clone(),
            })?;

            if input.claimed_value != Some(stored.value) {
                return Err(ValidationError::ValueMismatch {
                    block,
                    tx: tx_index,
                    output_id: input.output_id.clone(),
                    claimed: input.claimed_value,
                    stored: stored.value,
                });
            }
        }

        let id = tx.id.as_ref().ok_or(ValidationError::MissingTransactionId { block, tx: tx_index })?;
        for output in &tx.outputs {
            if *output != TxOutput::new(output.owner, output.value, id.clone()) {
                return Err(ValidationError::ForgedOutput {
                    block,
                    tx: tx_index,
                    output_id: output.id.clone(),
                });
            }
            utxos.put(output.clone());
        }

        if tx.outputs.first().is_none_or(|out| out.owner != tx.recipient) {
            return Err(ValidationError::WrongRecipient { block, tx: tx_index });
        }

        if tx.outputs.get(1).is_some_and(|out| out.owner != tx.sender) {
            return Err(ValidationError::WrongChangeOwner { block, tx: tx_index });
        }

        Ok(())
    }
}
