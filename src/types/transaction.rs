//! Transaction-related types for the loyalty rewards engine
//!
//! This module defines the entity identifiers shared across the crate and the
//! purchase transaction records persisted by the transaction store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Customer identifier
pub type UserId = u32;

/// Merchant identifier
pub type MerchantId = u32;

/// Branch (store location) identifier
pub type BranchId = u32;

/// Campaign identifier
pub type CampaignId = u32;

/// Transaction identifier, assigned by the transaction store
pub type TransactionId = u64;

/// Reward ledger entry identifier, assigned by the reward ledger
pub type RewardId = u64;

/// A purchase transaction that has not been persisted yet
///
/// The transaction store assigns the identifier on creation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The customer who made the purchase
    pub user: UserId,

    /// The merchant the purchase was made with
    pub merchant: MerchantId,

    /// The branch where the purchase happened, if known
    pub branch: Option<BranchId>,

    /// Purchase amount in currency units (always positive)
    pub amount: Decimal,

    /// When the purchase happened
    pub date: DateTime<Utc>,
}

/// A persisted purchase transaction
///
/// Immutable once created. Owned by the transaction store.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Store-assigned identifier
    pub id: TransactionId,

    /// The customer who made the purchase
    pub user: UserId,

    /// The merchant the purchase was made with
    pub merchant: MerchantId,

    /// The branch where the purchase happened, if known
    pub branch: Option<BranchId>,

    /// Purchase amount in currency units
    pub amount: Decimal,

    /// When the purchase happened
    pub date: DateTime<Utc>,
}

impl Transaction {
    /// Build the persisted form of a new transaction
    pub fn from_new(id: TransactionId, tx: NewTransaction) -> Self {
        Transaction {
            id,
            user: tx.user,
            merchant: tx.merchant,
            branch: tx.branch,
            amount: tx.amount,
            date: tx.date,
        }
    }
}
