//! Loyalty engine
//!
//! This module provides the LoyaltyEngine that routes inbound events to the
//! accrual and redemption engines and answers balance queries.
//!
//! Both engines share one [`KeyLocks`] registry, so a purchase granting to a
//! key and a redemption consuming from it are serialized.

use crate::core::accrual::AccrualEngine;
use crate::core::key_locks::KeyLocks;
use crate::core::redemption::RedemptionEngine;
use crate::core::store::{
    CampaignCatalog, InMemoryRewardLedger, InMemoryTransactionStore, MerchantDirectory,
};
use crate::core::traits::{CampaignQuery, MerchantLookup, RewardLedger, TransactionStore};
use crate::types::{
    EventOutcome, LoyaltyError, LoyaltyEvent, Reward, RewardBalance, RewardId, RewardKey,
    RewardTotals, UserId,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// The collaborators an engine is built from
#[derive(Clone)]
pub struct Collaborators {
    pub transactions: Arc<dyn TransactionStore>,
    pub campaigns: Arc<dyn CampaignQuery>,
    pub merchants: Arc<dyn MerchantLookup>,
    pub ledger: Arc<dyn RewardLedger>,
}

impl Collaborators {
    /// In-memory stores around a loaded catalog
    pub fn in_memory(merchants: Arc<MerchantDirectory>, campaigns: Arc<CampaignCatalog>) -> Self {
        Self {
            transactions: Arc::new(InMemoryTransactionStore::new()),
            campaigns,
            merchants,
            ledger: Arc::new(InMemoryRewardLedger::new()),
        }
    }
}

/// Loyalty engine
///
/// Thread-safe: wrap it in an `Arc` to share it between tokio tasks.
pub struct LoyaltyEngine {
    accrual: AccrualEngine,
    redemption: RedemptionEngine,
    ledger: Arc<dyn RewardLedger>,
}

impl LoyaltyEngine {
    /// Build both engines over the same collaborators and lock registry
    pub fn new(collaborators: Collaborators) -> Self {
        let Collaborators {
            transactions,
            campaigns,
            merchants,
            ledger,
        } = collaborators;
        let locks = Arc::new(KeyLocks::new());

        LoyaltyEngine {
            accrual: AccrualEngine::new(
                Arc::clone(&transactions),
                campaigns,
                merchants,
                Arc::clone(&ledger),
                Arc::clone(&locks),
            ),
            redemption: RedemptionEngine::new(transactions, Arc::clone(&ledger), locks),
            ledger,
        }
    }

    /// Process a single event
    ///
    /// Purchases go through accrual, redemptions through redemption.
    ///
    /// # Errors
    ///
    /// Returns whatever error the selected engine reports.
    pub fn process(&self, event: LoyaltyEvent) -> Result<EventOutcome, LoyaltyError> {
        match event {
            LoyaltyEvent::Purchase(purchase) => self
                .accrual
                .process_transaction(purchase)
                .map(EventOutcome::Accrued),
            LoyaltyEvent::Redeem(request) => self
                .redemption
                .redeem_rewards(request)
                .map(EventOutcome::Redeemed),
        }
    }

    /// Every grant a user still holds, oldest first
    pub fn rewards_for_user(&self, user: UserId) -> Result<Vec<Reward>, LoyaltyError> {
        self.ledger.list_by_user(user)
    }

    /// A user's points and cashback summed across merchants
    pub fn totals_for_user(&self, user: UserId) -> Result<RewardTotals, LoyaltyError> {
        let rewards = self.ledger.list_by_user(user)?;
        RewardTotals::from_rewards(user, &rewards)
    }

    /// Balance for one (user, merchant, type); zero when nothing is held
    pub fn balance(&self, key: &RewardKey) -> Result<Decimal, LoyaltyError> {
        self.ledger
            .list_by_user_merchant_type(key)?
            .iter()
            .try_fold(Decimal::ZERO, |total, reward| {
                total
                    .checked_add(reward.amount)
                    .ok_or_else(|| LoyaltyError::arithmetic_overflow("balance", key.user))
            })
    }

    /// A single grant
    pub fn reward(&self, id: RewardId) -> Result<Reward, LoyaltyError> {
        self.ledger.get(id)
    }

    /// Every non-zero balance, sorted by key
    pub fn balances(&self) -> Result<Vec<RewardBalance>, LoyaltyError> {
        self.ledger.balances()
    }
}
