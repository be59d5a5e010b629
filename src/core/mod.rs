//! Core business logic module
//!
//! This module contains the reward processing components:
//! - `traits` - Collaborator contracts the engines depend on
//! - `store` - In-memory collaborator implementations
//! - `accrual` - Purchase to reward grant conversion
//! - `redemption` - Ordered depletion of reward grants
//! - `engine` - Event routing and balance queries
//! - `batch_processor` - User-partitioned concurrent batch processing
//! - `unit_of_work` / `key_locks` - Atomicity and isolation primitives

pub mod accrual;
pub mod batch_processor;
pub mod engine;
pub mod key_locks;
pub mod redemption;
pub mod store;
pub mod traits;
pub mod unit_of_work;

#[cfg(test)]
pub(crate) mod test_support;

pub use accrual::AccrualEngine;
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use engine::{Collaborators, LoyaltyEngine};
pub use key_locks::KeyLocks;
pub use redemption::RedemptionEngine;
pub use unit_of_work::UnitOfWork;
