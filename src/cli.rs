// CLI commands

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::{encode_key, format_amount, Block, Hash, COIN};
use crate::{Ledger, LedgerConfig, Wallet};

#[derive(Parser)]
#[command(name = "utxo-ledger")]
#[command(about = "Educational single-process UTXO ledger", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the genesis + three block transfer scenario and validate the chain
    Demo(ConfigArgs),

    /// Mine a single empty block and report the search
    Mine(ConfigArgs),

    /// Print the effective configuration as JSON
    Config(ConfigArgs),
}

#[derive(Args, Default)]
pub struct ConfigArgs {
    /// JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Leading zero hex characters required in block hashes
    #[arg(short, long)]
    pub difficulty: Option<usize>,

    /// Minimum inputs total for a transaction, in base units
    #[arg(short, long)]
    pub min_value: Option<u64>,
}

impl ConfigArgs {
    /// Defaults, overlaid by the config file, overlaid by flags
    pub fn resolve(&self) -> Result<LedgerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                LedgerConfig::load(path)
                    .with_context(|| format!("loading {}", path.display()))?
            }
            None => LedgerConfig::default(),
        };

        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(min_value) = self.min_value {
            config.minimum_transaction_value = min_value;
        }

        config.validate()?;
        Ok(config)
    }
}

/// CLI handler
#[derive(Default)]
pub struct CliHandler;

impl CliHandler {
    pub fn new() -> Self {
        Self
    }

    /// Handle CLI command
    pub fn handle(&self, cli: Cli) -> Result<()> {
        match cli.command {
            Commands::Demo(args) => self.demo(args.resolve()?),
            Commands::Mine(args) => self.mine(args.resolve()?),
            Commands::Config(args) => self.show_config(args.resolve()?),
        }
    }

    fn demo(&self, config: LedgerConfig) -> Result<()> {
        println!("Difficulty: {}, minimum transaction: {}",
            config.difficulty,
            format_amount(config.minimum_transaction_value)
        );

        let mut ledger = Ledger::new(config)?;
        let min = ledger.config().minimum_transaction_value;

        let wallet_a = Wallet::new();
        let wallet_b = Wallet::new();
        let coinbase = Wallet::new();

        println!("Creating and mining genesis block...");
        ledger.create_genesis(coinbase.keys(), &wallet_a.public_key(), 100 * COIN)?;
        self.print_balances(&ledger, &wallet_a, &wallet_b);

        let transfers = [
            (&wallet_a, &wallet_b, 40 * COIN, "A -> B"),
            (&wallet_a, &wallet_b, 1000 * COIN, "A -> B (more than A has)"),
            (&wallet_b, &wallet_a, 20 * COIN, "B -> A"),
        ];

        for (from, to, value, label) in transfers {
            println!("\n{}: {}", label, format_amount(value));

            let mut block = ledger.new_block()?;
            let tx = match from.send_funds(&to.public_key(), value, ledger.utxo_set(), min) {
                Ok(tx) => Some(tx),
                Err(e) => {
                    println!("  Transaction refused: {}", e);
                    None
                }
            };

            if ledger.add_transaction(&mut block, tx) {
                println!("  Transaction added to block");
            }

            let block = ledger.append(block)?;
            self.print_block(block);
            self.print_balances(&ledger, &wallet_a, &wallet_b);
        }

        match ledger.validate() {
            Ok(()) => println!("\nBlockchain is valid ({} blocks)", ledger.len()),
            Err(e) => println!("\nBlockchain is invalid: {}", e),
        }

        Ok(())
    }

    fn mine(&self, config: LedgerConfig) -> Result<()> {
        println!("Mining an empty block at difficulty {}...\n", config.difficulty);

        let mut block = Block::new(Hash::genesis_sentinel());
        let result = block.mine(config.difficulty);

        if result.success {
            println!("Block mined successfully!\n");
            println!("Nonce: {}", result.nonce);
            println!("Hash: {}", result.hash);
            println!("Attempts: {}", result.attempts);
            println!("Duration: {:?}", result.duration);
            println!("Hash rate: {:.2} H/s", result.hash_rate());
        } else {
            println!("Mining failed after {} attempts", result.attempts);
        }

        Ok(())
    }

    fn show_config(&self, config: LedgerConfig) -> Result<()> {
        println!("{}", config.to_json()?);
        Ok(())
    }

    fn print_balances(&self, ledger: &Ledger, wallet_a: &Wallet, wallet_b: &Wallet) {
        println!("  A balance: {}", format_amount(wallet_a.balance(ledger.utxo_set())));
        println!("  B balance: {}", format_amount(wallet_b.balance(ledger.utxo_set())));
    }

    /// Print block information
    fn print_block(&self, block: &Block) {
        println!("  Block: {}", block.hash);
        println!("    Previous: {}", block.prev_hash);
        println!("    Merkle root: {}", block.merkle_root);
        println!("    Nonce: {}", block.nonce);
        println!("    Transactions: {}", block.transactions.len());

        for (i, tx) in block.transactions.iter().enumerate() {
            let id = tx.id.as_ref().map(Hash::as_str).unwrap_or("-");
            println!("      [{}] {} to {}", i, id, encode_key(&tx.recipient));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_demo_flags() {
        let cli = Cli::try_parse_from(["utxo-ledger", "demo", "--difficulty", "2", "--min-value", "5"]).unwrap();
        let Commands::Demo(args) = cli.command else {
            panic!("expected demo command");
        };

        let config = args.resolve().unwrap();
        assert_eq!(config.difficulty, 2);
        assert_eq!(config.minimum_transaction_value, 5);
    }

    #[test]
    fn test_resolve_defaults() {
        let config = ConfigArgs::default().resolve().unwrap();
        assert_eq!(config, LedgerConfig::default());
    }

    #[test]
    fn test_resolve_rejects_bad_difficulty() {
        let args = ConfigArgs {
            difficulty: Some(100),
            ..Default::default()
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn test_demo_runs() {
        let config = LedgerConfig {
            difficulty: 1,
            minimum_transaction_value: COIN / 10,
        };
        assert!(CliHandler::new().demo(config).is_ok());
    }
}
