//! Collaborator doubles for exercising failure paths

use crate::core::store::InMemoryRewardLedger;
use crate::core::traits::RewardLedger;
use crate::types::{
    LoyaltyError, MerchantId, Reward, RewardBalance, RewardId, RewardKey, RewardType, UserId,
};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Ledger that fails exactly one write, chosen by its position
///
/// Creates, updates and deletes count as writes, numbered from 1. Every other
/// write, including the compensating ones of a rollback, goes through.
#[derive(Debug, Default)]
pub struct FlakyLedger {
    inner: InMemoryRewardLedger,
    writes: AtomicUsize,
    failing_write: AtomicUsize,
}

impl FlakyLedger {
    /// Fail the write numbered `failing_write`
    pub fn failing_write(failing_write: usize) -> Self {
        Self {
            inner: InMemoryRewardLedger::new(),
            writes: AtomicUsize::new(0),
            failing_write: AtomicUsize::new(failing_write),
        }
    }

    /// Reset the write counter and fail the `failing_write`-th write from now
    pub fn arm(&self, failing_write: usize) {
        self.writes.store(0, Ordering::SeqCst);
        self.failing_write.store(failing_write, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &InMemoryRewardLedger {
        &self.inner
    }

    fn count_write(&self, operation: &str) -> Result<(), LoyaltyError> {
        let write = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if write == self.failing_write.load(Ordering::SeqCst) {
            return Err(LoyaltyError::persistence(operation, "ledger unavailable"));
        }
        Ok(())
    }
}

impl RewardLedger for FlakyLedger {
    fn create(
        &self,
        user: UserId,
        merchant: MerchantId,
        reward_type: RewardType,
        amount: Decimal,
    ) -> Result<RewardId, LoyaltyError> {
        self.count_write("reward create")?;
        self.inner.create(user, merchant, reward_type, amount)
    }

    fn get(&self, id: RewardId) -> Result<Reward, LoyaltyError> {
        self.inner.get(id)
    }

    fn list_by_user_merchant_type(&self, key: &RewardKey) -> Result<Vec<Reward>, LoyaltyError> {
        self.inner.list_by_user_merchant_type(key)
    }

    fn list_by_user(&self, user: UserId) -> Result<Vec<Reward>, LoyaltyError> {
        self.inner.list_by_user(user)
    }

    fn update(&self, id: RewardId, new_amount: Decimal) -> Result<(), LoyaltyError> {
        self.count_write("reward update")?;
        self.inner.update(id, new_amount)
    }

    fn delete(&self, id: RewardId) -> Result<(), LoyaltyError> {
        self.count_write("reward delete")?;
        self.inner.delete(id)
    }

    fn restore(&self, reward: Reward) -> Result<(), LoyaltyError> {
        self.inner.restore(reward)
    }

    fn balances(&self) -> Result<Vec<RewardBalance>, LoyaltyError> {
        self.inner.balances()
    }
}
