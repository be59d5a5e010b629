//! Synchronous processing strategy
//!
//! Single-threaded implementation of [`ProcessingStrategy`]. It only
//! orchestrates:
//! - CSV parsing is delegated to `SyncReader` (iterator interface)
//! - Event processing to `LoyaltyEngine`
//! - CSV output to `csv_format::write_balances_csv`
//!
//! Events are streamed one at a time; memory grows with live reward entries
//! and recorded transactions, not with the input file.

use crate::core::{Collaborators, LoyaltyEngine};
use crate::io::catalog::Catalog;
use crate::io::csv_format::write_balances_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{ProcessingStrategy, RunSummary};
use crate::types::LoyaltyError;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    catalog: Catalog,
}

impl SyncProcessingStrategy {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LoyaltyError> {
        let engine = LoyaltyEngine::new(Collaborators::in_memory(
            self.catalog.merchants.clone(),
            self.catalog.campaigns.clone(),
        ));
        let reader = SyncReader::new(input_path)?;
        let mut summary = RunSummary::default();

        for result in reader {
            match result {
                Ok(event) => {
                    let user = event.user();
                    let event_type = event.event_type();
                    match engine.process(event) {
                        Ok(_) => summary.applied += 1,
                        Err(e) => {
                            summary.rejected += 1;
                            warn!(
                                user,
                                ?event_type,
                                kind = ?e.kind(),
                                error = %e,
                                "event rejected"
                            );
                        }
                    }
                }
                Err(e) => {
                    summary.unreadable += 1;
                    warn!(error = %e, "skipping unreadable event");
                }
            }
        }

        info!(
            applied = summary.applied,
            rejected = summary.rejected,
            unreadable = summary.unreadable,
            "sync run complete"
        );

        write_balances_csv(&engine.balances()?, output)
    }
}
