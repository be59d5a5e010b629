//! Asynchronous batch processing strategy
//!
//! Multi-threaded implementation of [`ProcessingStrategy`]. Events are read in
//! batches and each batch is partitioned by user for parallel processing.
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── Catalog (merchants + campaigns, shared read-only)
//!     ├── BatchConfig (batch_size, max_concurrent)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (user partitioning + tokio tasks)
//!         └── LoyaltyEngine (DashMap-backed stores, per-key locks)
//! ```
//!
//! Batches are processed one after another, so a user's events keep their
//! file order even when they span batches. Within a batch, users run in
//! parallel on the tokio multi-threaded runtime.

use crate::core::{BatchProcessor, Collaborators, LoyaltyEngine};
use crate::io::async_reader::AsyncReader;
use crate::io::catalog::Catalog;
use crate::io::csv_format::write_balances_csv;
use crate::strategy::{ProcessingStrategy, RunSummary};
use crate::types::LoyaltyError;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Events read per batch
    pub batch_size: usize,

    /// Worker threads of the tokio runtime
    pub max_concurrent: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a config, replacing zero values with the defaults
    pub fn new(batch_size: usize, max_concurrent: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                default = default.batch_size,
                "invalid batch_size 0, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent = if max_concurrent == 0 {
            warn!(
                default = default.max_concurrent,
                "invalid max_concurrent 0, using default"
            );
            default.max_concurrent
        } else {
            max_concurrent
        };

        Self {
            batch_size,
            max_concurrent,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    catalog: Catalog,
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(catalog: Catalog, config: BatchConfig) -> Self {
        Self { catalog, config }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LoyaltyError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent)
            .build()?;

        runtime.block_on(async {
            let engine = Arc::new(LoyaltyEngine::new(Collaborators::in_memory(
                self.catalog.merchants.clone(),
                self.catalog.campaigns.clone(),
            )));
            let processor = BatchProcessor::new(Arc::clone(&engine));

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| match e.kind() {
                    ErrorKind::NotFound => {
                        LoyaltyError::file_not_found(&input_path.display().to_string())
                    }
                    _ => LoyaltyError::from(e),
                })?;

            // csv-async reads futures-io, tokio files implement tokio-io
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);
            let mut summary = RunSummary::default();

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for result in processor.process_batch(batch).await {
                    match result.result {
                        Ok(_) => summary.applied += 1,
                        Err(e) => {
                            summary.rejected += 1;
                            warn!(
                                user = result.event.user(),
                                event_type = ?result.event.event_type(),
                                kind = ?e.kind(),
                                error = %e,
                                "event rejected"
                            );
                        }
                    }
                }
            }

            summary.unreadable = reader.skipped();

            info!(
                applied = summary.applied,
                rejected = summary.rejected,
                unreadable = summary.unreadable,
                batch_size = self.config.batch_size,
                "async run complete"
            );

            write_balances_csv(&engine.balances()?, output)
        })
    }
}
