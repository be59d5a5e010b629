//! Processing strategy module for event processing
//!
//! This module defines the Strategy pattern for complete processing pipelines,
//! encompassing CSV parsing, engine processing and balance output. This allows
//! different implementations (synchronous, asynchronous batch) to be selected
//! at runtime.

use crate::cli::StrategyType;
use crate::io::catalog::Catalog;
use crate::types::LoyaltyError;
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// A complete events-in, balances-out pipeline
pub trait ProcessingStrategy: Send + Sync {
    /// Process every event in `input_path` and write the final balances
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned (unreadable input, failed output).
    /// Rejected events are logged and skipped.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LoyaltyError>;
}

/// Build the strategy selected on the command line
///
/// `config` is only used by the async strategy; `None` means defaults.
pub fn create_strategy(
    strategy_type: StrategyType,
    catalog: Catalog,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(catalog)),
        StrategyType::Async => Box::new(AsyncProcessingStrategy::new(
            catalog,
            config.unwrap_or_default(),
        )),
    }
}

/// Counts reported at the end of a run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: usize,
    pub rejected: usize,
    pub unreadable: usize,
}
