//! Loyalty Rewards Engine Library
//!
//! # Overview
//!
//! Turns purchases into loyalty reward grants and redeems them again, with a
//! streaming CSV front end offering a sync and an async strategy.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (events, rewards, campaigns, errors)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::accrual`] - Campaign selection and reward grants
//!   - [`core::redemption`] - Ordered depletion of reward grants
//!   - [`core::engine`] - Event routing and balance queries
//!   - [`core::traits`] / [`core::store`] - Collaborator contracts and in-memory stores
//! - [`io`] - CSV reading, catalog loading and balance output
//! - [`strategy`] - Complete processing pipelines
//! - [`logging`] - Tracing subscriber setup
//!
//! # Accrual
//!
//! A purchase earns `amount × conversion_factor × value` of the campaign's
//! type for every active campaign whose minimum amount it meets. With no
//! qualifying campaign it earns `amount × conversion_factor` of the
//! merchant's default type.
//!
//! # Redemption
//!
//! A redemption draws from the user's grants at one merchant for one reward
//! type, oldest first, deleting consumed grants and reducing the last one
//! touched. It fails without changes when the balance is short.

pub mod cli;
pub mod core;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use core::{Collaborators, LoyaltyEngine};
pub use io::{write_balances_csv, Catalog};
pub use types::{
    ErrorKind, LoyaltyError, LoyaltyEvent, Reward, RewardBalance, RewardKey, RewardType,
};
