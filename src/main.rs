//! Loyalty Rewards Engine CLI
//!
//! Command-line interface for accruing and redeeming loyalty rewards from CSV
//! event streams.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --merchants merchants.csv events.csv > balances.csv
//! cargo run -- --merchants merchants.csv --campaigns campaigns.csv events.csv > balances.csv
//! cargo run -- --strategy sync --merchants merchants.csv events.csv > balances.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 --merchants merchants.csv events.csv
//! LOYALTY_LOG=debug cargo run -- --merchants merchants.csv events.csv
//! ```
//!
//! The program loads the merchant and campaign catalog, applies every event
//! through the selected processing strategy and prints the final balance of
//! each (user, merchant, reward type) to stdout. Logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, invalid catalog, etc.)

use loyalty_rewards_engine::io::Catalog;
use loyalty_rewards_engine::{cli, logging, strategy};
use std::process;
use tracing::error;

fn main() {
    let args = cli::parse_args();
    logging::init_tracing(&args.log_level);

    let catalog = match Catalog::load(&args.merchants, args.campaigns.as_deref()) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!(kind = ?e.kind(), "failed to load catalog: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let config = match args.strategy {
        cli::StrategyType::Async => Some(args.to_batch_config()),
        cli::StrategyType::Sync => None,
    };
    let strategy = strategy::create_strategy(args.strategy, catalog, config);

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        error!(kind = ?e.kind(), "processing failed: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
