//! Merchant configuration consumed by accrual

use super::reward::RewardType;
use super::transaction::MerchantId;
use rust_decimal::Decimal;

/// A merchant and its default accrual rule
#[derive(Debug, Clone, PartialEq)]
pub struct Merchant {
    pub id: MerchantId,
    pub name: String,

    /// Reward units granted per currency unit spent
    pub conversion_factor: Decimal,

    /// Reward type granted when no campaign applies
    pub default_reward_type: RewardType,
}
