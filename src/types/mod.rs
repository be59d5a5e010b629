//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `transaction`: Entity identifiers and purchase transactions
//! - `reward`: Reward types, ledger entries and balances
//! - `campaign`: Campaigns and their activity rules
//! - `merchant`: Merchant accrual defaults
//! - `event`: Inbound events and engine outcomes
//! - `error`: Error types for the loyalty engine

pub mod campaign;
pub mod error;
pub mod event;
pub mod merchant;
pub mod reward;
pub mod transaction;

pub use campaign::Campaign;
pub use error::{ErrorKind, LoyaltyError};
pub use event::{
    AccrualOutcome, EventOutcome, EventType, LoyaltyEvent, PurchaseRequest, RedemptionOutcome,
    RedemptionRequest, RewardGrant,
};
pub use merchant::Merchant;
pub use reward::{Reward, RewardBalance, RewardKey, RewardTotals, RewardType};
pub use transaction::{
    BranchId, CampaignId, MerchantId, NewTransaction, RewardId, Transaction, TransactionId,
    UserId,
};
