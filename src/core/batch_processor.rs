//! Batch processing with user-based partitioning
//!
//! This module provides the `BatchProcessor`, which processes a batch of events
//! concurrently while keeping each user's events in input order.
//!
//! # Design
//!
//! A batch is partitioned by user id. Each partition runs sequentially on its
//! own tokio task; partitions run in parallel. Every event touches only keys
//! of its own user, so partitions never contend for the same key locks.
//!
//! ```text
//! BatchProcessor
//!     └── Arc<LoyaltyEngine>  (shared by every partition task)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::error;

use crate::core::engine::LoyaltyEngine;
use crate::types::{EventOutcome, LoyaltyError, LoyaltyEvent, UserId};

/// Result of processing a single event
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The event that was processed
    pub event: LoyaltyEvent,

    /// What the engine did, or why it refused
    pub result: Result<EventOutcome, LoyaltyError>,
}

/// Batch processor with user-based partitioning
#[derive(Clone)]
pub struct BatchProcessor {
    engine: Arc<LoyaltyEngine>,
}

impl BatchProcessor {
    pub fn new(engine: Arc<LoyaltyEngine>) -> Self {
        Self { engine }
    }

    /// Group events by user, keeping each user's events in input order
    pub fn partition_by_user(
        &self,
        batch: Vec<LoyaltyEvent>,
    ) -> HashMap<UserId, Vec<LoyaltyEvent>> {
        let mut user_batches: HashMap<UserId, Vec<LoyaltyEvent>> = HashMap::new();

        for event in batch {
            user_batches.entry(event.user()).or_default().push(event);
        }

        user_batches
    }

    /// Process one user's events sequentially
    pub async fn process_user_events(&self, events: Vec<LoyaltyEvent>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(events.len());

        for event in events {
            let result = self.engine.process(event.clone());
            results.push(ProcessingResult { event, result });
        }

        results
    }

    /// Process a batch, one task per user
    ///
    /// Results for one user keep that user's input order; results of different
    /// users are not ordered relative to each other. A panicking task is logged
    /// and its results are lost.
    pub async fn process_batch(&self, batch: Vec<LoyaltyEvent>) -> Vec<ProcessingResult> {
        let user_batches = self.partition_by_user(batch);

        let mut tasks = Vec::with_capacity(user_batches.len());
        for (_user, events) in user_batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_user_events(events).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(user_results) => results.extend(user_results),
                Err(e) => error!(error = %e, "partition task panicked"),
            }
        }

        results
    }
}
