//! Collaborator traits consumed by the accrual and redemption engines
//!
//! The engines never touch storage directly. They reach persisted state only
//! through these narrow contracts, so an in-memory store, a SQL database or a
//! test double can be plugged in by the composition root.
//!
//! All methods take `&self`: implementations are shared between tokio tasks
//! behind an `Arc` and synchronize internally.

use crate::types::{
    BranchId, Campaign, LoyaltyError, Merchant, MerchantId, NewTransaction, Reward,
    RewardBalance, RewardId, RewardKey, RewardType, Transaction, TransactionId, UserId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Persists raw purchase transactions
pub trait TransactionStore: Send + Sync {
    /// Persist a transaction and return its assigned id
    fn create(&self, transaction: NewTransaction) -> Result<TransactionId, LoyaltyError>;

    /// Look up a transaction by id
    fn get(&self, id: TransactionId) -> Result<Transaction, LoyaltyError>;

    /// Remove a transaction
    ///
    /// Only used to undo a creation when the surrounding unit of work rolls back.
    fn delete(&self, id: TransactionId) -> Result<(), LoyaltyError>;
}

/// Finds campaigns running for a purchase
pub trait CampaignQuery: Send + Sync {
    /// Campaigns of `merchant` active at `date` for `branch`
    ///
    /// With no branch only merchant-wide campaigns are returned.
    fn find_active(
        &self,
        merchant: MerchantId,
        branch: Option<BranchId>,
        date: DateTime<Utc>,
    ) -> Result<Vec<Campaign>, LoyaltyError>;
}

/// Resolves merchant accrual defaults
pub trait MerchantLookup: Send + Sync {
    fn get(&self, merchant: MerchantId) -> Result<Merchant, LoyaltyError>;
}

/// Stores individual reward grants
pub trait RewardLedger: Send + Sync {
    /// Create a grant and return its id
    fn create(
        &self,
        user: UserId,
        merchant: MerchantId,
        reward_type: RewardType,
        amount: Decimal,
    ) -> Result<RewardId, LoyaltyError>;

    /// Look up a single grant
    fn get(&self, id: RewardId) -> Result<Reward, LoyaltyError>;

    /// All grants for a key, in creation order
    fn list_by_user_merchant_type(&self, key: &RewardKey) -> Result<Vec<Reward>, LoyaltyError>;

    /// All grants a user holds, across merchants and types, in creation order
    fn list_by_user(&self, user: UserId) -> Result<Vec<Reward>, LoyaltyError>;

    /// Replace the remaining amount of a grant
    fn update(&self, id: RewardId, new_amount: Decimal) -> Result<(), LoyaltyError>;

    /// Remove a grant
    fn delete(&self, id: RewardId) -> Result<(), LoyaltyError>;

    /// Put a previously read grant back exactly as it was, id included
    ///
    /// Only used to undo an update or delete when a unit of work rolls back.
    fn restore(&self, reward: Reward) -> Result<(), LoyaltyError>;

    /// Summed balance of every key that still has entries
    fn balances(&self) -> Result<Vec<RewardBalance>, LoyaltyError>;
}
