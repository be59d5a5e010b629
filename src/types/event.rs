//! Inbound loyalty events and the outcomes the engines report for them

use super::reward::RewardType;
use super::transaction::{BranchId, MerchantId, RewardId, TransactionId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Event types accepted on the input stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// A customer purchase that accrues rewards
    Purchase,

    /// A customer redeeming previously accrued rewards
    Redeem,
}

/// A purchase to run through accrual
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRequest {
    pub user: UserId,
    pub merchant: MerchantId,
    pub branch: Option<BranchId>,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

/// A redemption to run through the redemption engine
#[derive(Debug, Clone, PartialEq)]
pub struct RedemptionRequest {
    pub user: UserId,
    pub merchant: MerchantId,
    pub amount: Decimal,
    pub reward_type: RewardType,
}

/// A single inbound event
#[derive(Debug, Clone, PartialEq)]
pub enum LoyaltyEvent {
    Purchase(PurchaseRequest),
    Redeem(RedemptionRequest),
}

impl LoyaltyEvent {
    /// The user the event belongs to, used for partitioning
    pub fn user(&self) -> UserId {
        match self {
            LoyaltyEvent::Purchase(purchase) => purchase.user,
            LoyaltyEvent::Redeem(redemption) => redemption.user,
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            LoyaltyEvent::Purchase(_) => EventType::Purchase,
            LoyaltyEvent::Redeem(_) => EventType::Redeem,
        }
    }
}

/// A reward written by accrual
#[derive(Debug, Clone, PartialEq)]
pub struct RewardGrant {
    pub reward: RewardId,
    pub reward_type: RewardType,
    pub amount: Decimal,
}

/// What accrual did for one purchase
#[derive(Debug, Clone, PartialEq)]
pub struct AccrualOutcome {
    pub transaction: TransactionId,

    /// Grants written, in campaign order; empty when every computed grant was zero
    pub grants: Vec<RewardGrant>,

    /// True when no campaign qualified and the merchant default was applied
    pub used_default: bool,
}

/// What redemption did for one request
#[derive(Debug, Clone, PartialEq)]
pub struct RedemptionOutcome {
    pub redeemed: Decimal,

    /// Entries fully consumed and deleted
    pub deleted: Vec<RewardId>,

    /// Entry partially consumed, with its remaining amount
    pub reduced: Option<(RewardId, Decimal)>,
}

/// Outcome of routing one event through the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Accrued(AccrualOutcome),
    Redeemed(RedemptionOutcome),
}
