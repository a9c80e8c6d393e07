// The chain: blocks, the live UTXO set, and the transaction id allocator

use crate::config::{ConfigError, LedgerConfig};
use crate::consensus::{CancelToken, ChainValidator, Miner, ValidationError};
use crate::core::{Amount, Block, Hash, KeyPair, ProcessContext, Transaction, TxOutput, TxSequence};
use crate::storage::UtxoSet;
use secp256k1::PublicKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("genesis block already exists")]
    GenesisExists,
    #[error("genesis block has not been created")]
    MissingGenesis,
    #[error("block builds on {found}, but the tip is {expected}")]
    NotOnTip { expected: Hash, found: Hash },
    #[error("mining was cancelled after {0} attempts")]
    MiningCancelled(u64),
    #[error("no nonce satisfies difficulty {0}")]
    MiningFailed(usize),
}

/// Live state as of the last appended block
#[derive(Debug, Clone, Default)]
struct Checkpoint {
    utxo_set: UtxoSet,
    sequence: TxSequence,
}

/// Single authoritative, append-only ledger
pub struct Ledger {
    config: LedgerConfig,
    blocks: Vec<Block>,
    utxo_set: UtxoSet,
    sequence: TxSequence,
    committed: Checkpoint,
    genesis_output: Option<TxOutput>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;

        Ok(Self {
            config,
            blocks: Vec::new(),
            utxo_set: UtxoSet::new(),
            sequence: TxSequence::new(),
            committed: Checkpoint::default(),
            genesis_output: None,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The live UTXO set, including effects of the block being built
    pub fn utxo_set(&self) -> &UtxoSet {
        &self.utxo_set
    }

    pub fn genesis_output(&self) -> Option<&TxOutput> {
        self.genesis_output.as_ref()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Hash of the last block
    pub fn tip_hash(&self) -> Option<&Hash> {
        self.blocks.last().map(|block| &block.hash)
    }

    pub fn balance_of(&self, owner: &PublicKey) -> Amount {
        self.utxo_set.balance_of(owner)
    }

    /// Mint `value` to `recipient` in a signed coinbase, and append the genesis block holding it
    pub fn create_genesis(
        &mut self,
        coinbase: &KeyPair,
        recipient: &PublicKey,
        value: Amount,
    ) -> Result<&Block, LedgerError> {
        self.mint_genesis(coinbase, recipient, value, Miner::new(self.config.difficulty))
    }

    /// Like `create_genesis`, but mining stops when `cancel` is triggered
    pub fn create_genesis_with_cancel(
        &mut self,
        coinbase: &KeyPair,
        recipient: &PublicKey,
        value: Amount,
        cancel: &CancelToken,
    ) -> Result<&Block, LedgerError> {
        let miner = Miner::new(self.config.difficulty).with_cancel(cancel.clone());
        self.mint_genesis(coinbase, recipient, value, miner)
    }

    fn mint_genesis(
        &mut self,
        coinbase: &KeyPair,
        recipient: &PublicKey,
        value: Amount,
        miner: Miner,
    ) -> Result<&Block, LedgerError> {
        if !self.blocks.is_empty() {
            return Err(LedgerError::GenesisExists);
        }

        let mut tx = Transaction::coinbase(coinbase.public_key, *recipient, value);
        tx.sign(&coinbase.secret_key);
        let output = tx.assign_genesis_id().clone();

        // Genesis transactions are not processed, so nothing live changes here
        let mut genesis = Block::new(Hash::genesis_sentinel());
        self.add_transaction(&mut genesis, Some(tx));

        log::info!("Creating and mining genesis block");
        self.mine(&mut genesis, &miner)?;

        self.utxo_set.put(output.clone());
        self.genesis_output = Some(output);
        Ok(self.push(genesis))
    }

    /// Start a block on top of the current tip.
    /// Effects of a block that was started but never appended are discarded.
    pub fn new_block(&mut self) -> Result<Block, LedgerError> {
        let tip = self.tip_hash().cloned().ok_or(LedgerError::MissingGenesis)?;
        self.rollback();
        Ok(Block::new(tip))
    }

    /// Process `tx` against the live UTXO set and add it to `block`
    pub fn add_transaction(&mut self, block: &mut Block, tx: Option<Transaction>) -> bool {
        let mut ctx = ProcessContext {
            utxo_set: &mut self.utxo_set,
            sequence: &mut self.sequence,
            minimum_value: self.config.minimum_transaction_value,
        };
        block.add_transaction(tx, &mut ctx)
    }

    /// Mine `block` at the configured difficulty and append it
    pub fn append(&mut self, block: Block) -> Result<&Block, LedgerError> {
        self.append_on_tip(block, Miner::new(self.config.difficulty))
    }

    /// Like `append`, but mining stops when `cancel` is triggered.
    /// A cancelled block is dropped and its transactions are undone.
    pub fn append_with_cancel(&mut self, block: Block, cancel: &CancelToken) -> Result<&Block, LedgerError> {
        self.append_on_tip(block, Miner::new(self.config.difficulty).with_cancel(cancel.clone()))
    }

    fn append_on_tip(&mut self, mut block: Block, miner: Miner) -> Result<&Block, LedgerError> {
        if let Err(e) = self.check_tip(&block) {
            self.rollback();
            return Err(e);
        }

        self.mine(&mut block, &miner)?;
        Ok(self.push(block))
    }

    fn check_tip(&self, block: &Block) -> Result<(), LedgerError> {
        let tip = self.tip_hash().ok_or(LedgerError::MissingGenesis)?;
        if &block.prev_hash != tip {
            return Err(LedgerError::NotOnTip {
                expected: tip.clone(),
                found: block.prev_hash.clone(),
            });
        }
        Ok(())
    }

    /// Run the nonce search; on any failure the live state falls back to the last checkpoint
    fn mine(&mut self, block: &mut Block, miner: &Miner) -> Result<(), LedgerError> {
        let result = miner.mine(block);
        if result.cancelled {
            log::info!("Discarding cancelled block");
            self.rollback();
            return Err(LedgerError::MiningCancelled(result.attempts));
        }
        if !result.success {
            self.rollback();
            return Err(LedgerError::MiningFailed(miner.difficulty));
        }
        Ok(())
    }

    fn push(&mut self, block: Block) -> &Block {
        self.blocks.push(block);
        self.committed = Checkpoint {
            utxo_set: self.utxo_set.clone(),
            sequence: self.sequence.clone(),
        };
        &self.blocks[self.blocks.len() - 1]
    }

    fn rollback(&mut self) {
        self.utxo_set = self.committed.utxo_set.clone();
        self.sequence = self.committed.sequence.clone();
    }

    /// Replay the whole chain on a temporary UTXO set
    pub fn validate(&self) -> Result<(), ValidationError> {
        let result = ChainValidator::new(self.config.difficulty)
            .validate(&self.blocks, self.genesis_output.as_ref());

        if let Err(e) = &result {
            log::warn!("Chain is invalid: {}", e);
        }
        result
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::COIN;
    use crate::wallet::Wallet;

    fn test_config() -> LedgerConfig {
        LedgerConfig {
            difficulty: 2,
            minimum_transaction_value: COIN / 10,
        }
    }

    struct Scenario {
        ledger: Ledger,
        wallet_a: Wallet,
        wallet_b: Wallet,
    }

    /// Genesis 100 to A, then A->B 40, A over-spends 1000, B->A 20
    fn settle() -> Scenario {
        let mut ledger = Ledger::new(test_config()).unwrap();
        let coinbase = Wallet::new();
        let wallet_a = Wallet::new();
        let wallet_b = Wallet::new();

        ledger
            .create_genesis(coinbase.keys(), &wallet_a.public_key(), 100 * COIN)
            .unwrap();

        let min = ledger.config().minimum_transaction_value;

        let mut block1 = ledger.new_block().unwrap();
        let tx = wallet_a.send_funds(&wallet_b.public_key(), 40 * COIN, ledger.utxo_set(), min).ok();
        assert!(ledger.add_transaction(&mut block1, tx));
        ledger.append(block1).unwrap();

        let mut block2 = ledger.new_block().unwrap();
        let tx = wallet_a.send_funds(&wallet_b.public_key(), 1000 * COIN, ledger.utxo_set(), min).ok();
        assert!(!ledger.add_transaction(&mut block2, tx));
        ledger.append(block2).unwrap();

        let mut block3 = ledger.new_block().unwrap();
        let tx = wallet_b.send_funds(&wallet_a.public_key(), 20 * COIN, ledger.utxo_set(), min).ok();
        assert!(ledger.add_transaction(&mut block3, tx));
        ledger.append(block3).unwrap();

        Scenario {
            ledger,
            wallet_a,
            wallet_b,
        }
    }

    #[test]
    fn test_end_to_end_settlement() {
        let s = settle();

        assert_eq!(s.ledger.len(), 4);
        assert!(s.ledger.blocks()[2].transactions.is_empty());
        assert_eq!(s.ledger.validate(), Ok(()));
        assert_eq!(s.wallet_a.balance(s.ledger.utxo_set()), 80 * COIN);
        assert_eq!(s.wallet_b.balance(s.ledger.utxo_set()), 20 * COIN);
        assert_eq!(s.ledger.balance_of(&s.wallet_a.public_key()), 80 * COIN);
    }

    #[test]
    fn test_blocks_are_linked_and_mined() {
        let s = settle();
        let blocks = s.ledger.blocks();

        assert!(blocks[0].is_genesis());
        for pair in blocks.windows(2) {
            assert_eq!(pair[1].prev_hash, pair[0].hash);
            assert!(pair[1].meets_difficulty(2));
        }
        assert_eq!(s.ledger.tip_hash(), Some(&blocks[3].hash));
    }

    #[test]
    fn test_validation_leaves_live_set_alone() {
        let s = settle();
        let before: Vec<TxOutput> = s.ledger.utxo_set().iter().cloned().collect();

        assert!(s.ledger.is_valid());
        assert!(s.ledger.is_valid());

        let after: Vec<TxOutput> = s.ledger.utxo_set().iter().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_tamper_nonce() {
        let mut s = settle();
        s.ledger.blocks[2].nonce += 1;
        assert!(!s.ledger.is_valid());
    }

    #[test]
    fn test_tamper_prev_hash() {
        let mut s = settle();
        s.ledger.blocks[3].prev_hash = s.ledger.blocks[1].hash.clone();
        assert!(!s.ledger.is_valid());
    }

    #[test]
    fn test_tamper_transaction_value() {
        let mut s = settle();
        s.ledger.blocks[1].transactions[0].value = 90 * COIN;
        assert!(!s.ledger.is_valid());
    }

    #[test]
    fn test_genesis_only_once() {
        let mut s = settle();
        let coinbase = Wallet::new();
        let result = s.ledger.create_genesis(coinbase.keys(), &s.wallet_b.public_key(), COIN);
        assert!(matches!(result, Err(LedgerError::GenesisExists)));
    }

    #[test]
    fn test_new_block_requires_genesis() {
        let mut ledger = Ledger::new(test_config()).unwrap();
        assert!(matches!(ledger.new_block(), Err(LedgerError::MissingGenesis)));
        assert_eq!(ledger.validate(), Err(ValidationError::EmptyChain));
    }

    fn cancelled() -> CancelToken {
        let cancel = CancelToken::new();
        cancel.cancel();
        cancel
    }

    #[test]
    fn test_cancelled_append_undoes_transactions() {
        let mut ledger = Ledger::new(test_config()).unwrap();
        let coinbase = Wallet::new();
        let wallet_a = Wallet::new();
        let wallet_b = Wallet::new();
        ledger
            .create_genesis(coinbase.keys(), &wallet_a.public_key(), 100 * COIN)
            .unwrap();
        let min = ledger.config().minimum_transaction_value;

        let mut block = ledger.new_block().unwrap();
        let tx = wallet_a.send_funds(&wallet_b.public_key(), 40 * COIN, ledger.utxo_set(), min).ok();
        assert!(ledger.add_transaction(&mut block, tx));
        assert_eq!(ledger.balance_of(&wallet_b.public_key()), 40 * COIN);

        let result = ledger.append_with_cancel(block, &cancelled());
        assert!(matches!(result, Err(LedgerError::MiningCancelled(0))));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.balance_of(&wallet_a.public_key()), 100 * COIN);
        assert_eq!(ledger.balance_of(&wallet_b.public_key()), 0);

        // B has nothing to spend, so a follow-up payment is refused
        let mut block = ledger.new_block().unwrap();
        let tx = wallet_b.send_funds(&wallet_a.public_key(), 20 * COIN, ledger.utxo_set(), min).ok();
        assert!(!ledger.add_transaction(&mut block, tx));
        ledger.append(block).unwrap();

        assert_eq!(ledger.validate(), Ok(()));
    }

    #[test]
    fn test_new_block_discards_unappended_block() {
        let mut s = settle();
        let min = s.ledger.config().minimum_transaction_value;

        let mut abandoned = s.ledger.new_block().unwrap();
        let tx = s.wallet_a.send_funds(&s.wallet_b.public_key(), 10 * COIN, s.ledger.utxo_set(), min).ok();
        assert!(s.ledger.add_transaction(&mut abandoned, tx));

        let block = s.ledger.new_block().unwrap();
        assert_eq!(s.ledger.balance_of(&s.wallet_a.public_key()), 80 * COIN);
        s.ledger.append(block).unwrap();
        assert!(s.ledger.is_valid());
    }

    #[test]
    fn test_cancelled_genesis_can_be_retried() {
        let mut ledger = Ledger::new(test_config()).unwrap();
        let coinbase = Wallet::new();
        let wallet_a = Wallet::new();

        let result = ledger.create_genesis_with_cancel(coinbase.keys(), &wallet_a.public_key(), 100 * COIN, &cancelled());
        assert!(matches!(result, Err(LedgerError::MiningCancelled(0))));
        assert!(ledger.is_empty());
        assert!(ledger.utxo_set().is_empty());
        assert!(ledger.genesis_output().is_none());

        ledger
            .create_genesis(coinbase.keys(), &wallet_a.public_key(), 100 * COIN)
            .unwrap();
        assert_eq!(ledger.utxo_set().len(), 1);
        assert_eq!(ledger.balance_of(&wallet_a.public_key()), 100 * COIN);
        assert!(ledger.is_valid());
    }

    #[test]
    fn test_append_requires_tip() {
        let mut s = settle();

        let stale = Block::new(s.ledger.blocks()[1].hash.clone());
        let result = s.ledger.append(stale);
        assert!(matches!(result, Err(LedgerError::NotOnTip { .. })));

        let second_genesis = Block::new(Hash::genesis_sentinel());
        let result = s.ledger.append(second_genesis);
        assert!(matches!(result, Err(LedgerError::NotOnTip { .. })));

        assert_eq!(s.ledger.len(), 4);
        assert!(s.ledger.is_valid());
    }

    #[test]
    fn test_append_requires_genesis() {
        let mut ledger = Ledger::new(test_config()).unwrap();
        let result = ledger.append(Block::new(Hash::genesis_sentinel()));
        assert!(matches!(result, Err(LedgerError::MissingGenesis)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_tamper_genesis_transaction_value() {
        let mut s = settle();
        s.ledger.blocks[0].transactions[0].value = 1_000_000 * COIN;
        assert!(!s.ledger.is_valid());
    }

    #[test]
    fn test_tamper_genesis_output() {
        let mut s = settle();
        let recipient = s.wallet_b.public_key();
        let tx = &mut s.ledger.blocks[0].transactions[0];
        let value = tx.value;
        tx.outputs[0] = TxOutput::new(recipient, value, Hash::genesis_sentinel());
        assert_eq!(s.ledger.validate(), Err(ValidationError::GenesisOutputMismatch));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = Ledger::new(LedgerConfig {
            difficulty: 65,
            minimum_transaction_value: 0,
        });
        assert!(matches!(result, Err(LedgerError::Config(ConfigError::DifficultyTooHigh(65)))));
    }
}
