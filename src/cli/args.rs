//! Command-line argument definitions

use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Loyalty engine command line
#[derive(Parser, Debug)]
#[command(name = "loyalty-engine")]
#[command(
    about = "Accrue and redeem loyalty rewards from a CSV event stream",
    long_about = None
)]
pub struct CliArgs {
    #[arg(value_name = "EVENTS", help = "Path to the events CSV file")]
    pub input_file: PathBuf,

    #[arg(
        long = "merchants",
        value_name = "FILE",
        help = "Merchants CSV: id,name,conversion_factor,default_reward_type"
    )]
    pub merchants: PathBuf,

    #[arg(
        long = "campaigns",
        value_name = "FILE",
        help = "Campaigns CSV: id,merchant,branch,start_date,end_date,reward_type,value,min_amount"
    )]
    pub campaigns: Option<PathBuf>,

    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for sequential or 'async' for user-partitioned batches"
    )]
    pub strategy: StrategyType,

    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of events per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Worker threads for batch processing (default: CPU cores)"
    )]
    pub max_concurrent: Option<usize>,

    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "warn",
        help = "Log filter when LOYALTY_LOG is unset (e.g. 'info', 'loyalty_rewards_engine=debug')"
    )]
    pub log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_none() && self.max_concurrent.is_none() {
            return BatchConfig::default();
        }

        let default = BatchConfig::default();
        BatchConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.max_concurrent.unwrap_or(default.max_concurrent),
        )
    }
}
