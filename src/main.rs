// UTXO Ledger - CLI

use clap::Parser;
use utxo_ledger::{Cli, CliHandler};

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = CliHandler::new().handle(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
