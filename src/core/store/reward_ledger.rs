//! Thread-safe in-memory reward ledger
//!
//! # Design
//!
//! Entries are grouped by [`RewardKey`] in a `DashMap`, each key holding an
//! ordered map of its entries by id. Since ids grow monotonically, iterating a
//! key's map yields entries in creation order, which is the depletion order
//! used by redemption. A second `DashMap` locates an entry's key from its id.
//!
//! # Invariants
//!
//! - Every stored entry has an amount strictly greater than zero. `create`,
//!   `update` and `restore` reject anything else; a fully consumed entry must
//!   be deleted.
//! - A key whose last entry is deleted is removed, so `balances` never
//!   reports a zero balance.
//!
//! Guards from one map are never held while locking the other.

use crate::core::traits::RewardLedger;
use crate::types::{
    LoyaltyError, MerchantId, Reward, RewardBalance, RewardId, RewardKey, RewardType, UserId,
};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory [`RewardLedger`]
#[derive(Debug, Default)]
pub struct InMemoryRewardLedger {
    /// Entries grouped by key, ordered by id within a key
    entries: DashMap<RewardKey, BTreeMap<RewardId, Reward>>,

    /// Which key an entry id lives under
    locations: DashMap<RewardId, RewardKey>,

    /// Last id handed out; ids start at 1
    last_id: AtomicU64,
}

impl InMemoryRewardLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    fn locate(&self, id: RewardId) -> Result<RewardKey, LoyaltyError> {
        self.locations
            .get(&id)
            .map(|entry| *entry.value())
            .ok_or_else(|| LoyaltyError::not_found("reward", id))
    }

    fn ensure_positive(amount: Decimal, operation: &str) -> Result<(), LoyaltyError> {
        if amount <= Decimal::ZERO {
            return Err(LoyaltyError::invalid_amount(amount, operation));
        }
        Ok(())
    }

    fn insert(&self, reward: Reward) {
        let key = reward.key();
        let id = reward.id;
        self.entries.entry(key).or_default().insert(id, reward);
        self.locations.insert(id, key);
    }
}

impl RewardLedger for InMemoryRewardLedger {
    fn create(
        &self,
        user: UserId,
        merchant: MerchantId,
        reward_type: RewardType,
        amount: Decimal,
    ) -> Result<RewardId, LoyaltyError> {
        Self::ensure_positive(amount, "reward creation")?;

        let id = self.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.insert(Reward {
            id,
            user,
            merchant,
            reward_type,
            amount,
        });
        Ok(id)
    }

    fn get(&self, id: RewardId) -> Result<Reward, LoyaltyError> {
        let key = self.locate(id)?;
        self.entries
            .get(&key)
            .and_then(|rewards| rewards.get(&id).cloned())
            .ok_or_else(|| LoyaltyError::not_found("reward", id))
    }

    fn list_by_user_merchant_type(&self, key: &RewardKey) -> Result<Vec<Reward>, LoyaltyError> {
        Ok(self
            .entries
            .get(key)
            .map(|rewards| rewards.values().cloned().collect())
            .unwrap_or_default())
    }

    fn list_by_user(&self, user: UserId) -> Result<Vec<Reward>, LoyaltyError> {
        let mut rewards: Vec<Reward> = self
            .entries
            .iter()
            .filter(|entry| entry.key().user == user)
            .flat_map(|entry| entry.value().values().cloned().collect::<Vec<_>>())
            .collect();
        rewards.sort_by_key(|reward| reward.id);
        Ok(rewards)
    }

    fn update(&self, id: RewardId, new_amount: Decimal) -> Result<(), LoyaltyError> {
        Self::ensure_positive(new_amount, "reward update")?;

        let key = self.locate(id)?;
        let mut rewards = self
            .entries
            .get_mut(&key)
            .ok_or_else(|| LoyaltyError::not_found("reward", id))?;
        let reward = rewards
            .get_mut(&id)
            .ok_or_else(|| LoyaltyError::not_found("reward", id))?;
        reward.amount = new_amount;
        Ok(())
    }

    fn delete(&self, id: RewardId) -> Result<(), LoyaltyError> {
        let (_, key) = self
            .locations
            .remove(&id)
            .ok_or_else(|| LoyaltyError::not_found("reward", id))?;

        if let Some(mut rewards) = self.entries.get_mut(&key) {
            rewards.remove(&id);
        }
        self.entries.remove_if(&key, |_, rewards| rewards.is_empty());
        Ok(())
    }

    fn restore(&self, reward: Reward) -> Result<(), LoyaltyError> {
        Self::ensure_positive(reward.amount, "reward restore")?;
        self.insert(reward);
        Ok(())
    }

    fn balances(&self) -> Result<Vec<RewardBalance>, LoyaltyError> {
        let mut balances = Vec::with_capacity(self.entries.len());

        for entry in self.entries.iter() {
            let key = *entry.key();
            let mut balance = Decimal::ZERO;
            for reward in entry.value().values() {
                balance = balance
                    .checked_add(reward.amount)
                    .ok_or_else(|| LoyaltyError::arithmetic_overflow("balance", key.user))?;
            }
            if balance > Decimal::ZERO {
                balances.push(RewardBalance { key, balance });
            }
        }

        balances.sort_by_key(|balance| balance.key);
        Ok(balances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> RewardKey {
        RewardKey::new(1, 2, RewardType::Points)
    }

    #[test]
    fn test_created_reward_is_listed_with_its_amount() {
        let ledger = InMemoryRewardLedger::new();

        let id = ledger
            .create(1, 2, RewardType::Points, Decimal::new(20, 0))
            .unwrap();

        let listed = ledger.list_by_user_merchant_type(&key()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].amount, Decimal::new(20, 0));
    }

    #[test]
    fn test_list_preserves_creation_order() {
        let ledger = InMemoryRewardLedger::new();
        let ids: Vec<_> = [5, 3, 9]
            .iter()
            .map(|amount| {
                ledger
                    .create(1, 2, RewardType::Points, Decimal::new(*amount, 0))
                    .unwrap()
            })
            .collect();

        let listed: Vec<_> = ledger
            .list_by_user_merchant_type(&key())
            .unwrap()
            .into_iter()
            .map(|reward| reward.id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn test_list_is_scoped_to_key() {
        let ledger = InMemoryRewardLedger::new();
        ledger
            .create(1, 2, RewardType::Points, Decimal::new(10, 0))
            .unwrap();
        ledger
            .create(1, 2, RewardType::Cashback, Decimal::new(3, 0))
            .unwrap();
        ledger
            .create(1, 5, RewardType::Points, Decimal::new(7, 0))
            .unwrap();
        ledger
            .create(4, 2, RewardType::Points, Decimal::new(1, 0))
            .unwrap();

        let listed = ledger.list_by_user_merchant_type(&key()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(ledger.list_by_user(1).unwrap().len(), 3);
    }

    #[test]
    fn test_zero_amount_entries_are_rejected() {
        let ledger = InMemoryRewardLedger::new();

        assert!(ledger
            .create(1, 2, RewardType::Points, Decimal::ZERO)
            .is_err());

        let id = ledger
            .create(1, 2, RewardType::Points, Decimal::new(5, 0))
            .unwrap();
        assert!(matches!(
            ledger.update(id, Decimal::ZERO).unwrap_err(),
            LoyaltyError::InvalidAmount { .. }
        ));
        assert_eq!(ledger.get(id).unwrap().amount, Decimal::new(5, 0));
    }

    #[test]
    fn test_update_changes_remaining_amount() {
        let ledger = InMemoryRewardLedger::new();
        let id = ledger
            .create(1, 2, RewardType::Points, Decimal::new(15, 0))
            .unwrap();

        ledger.update(id, Decimal::new(5, 0)).unwrap();

        assert_eq!(ledger.get(id).unwrap().amount, Decimal::new(5, 0));
    }

    #[test]
    fn test_delete_removes_entry_and_empty_key() {
        let ledger = InMemoryRewardLedger::new();
        let id = ledger
            .create(1, 2, RewardType::Points, Decimal::new(15, 0))
            .unwrap();

        ledger.delete(id).unwrap();

        assert!(ledger.is_empty());
        assert!(ledger.get(id).is_err());
        assert!(ledger.list_by_user_merchant_type(&key()).unwrap().is_empty());
        assert!(ledger.balances().unwrap().is_empty());
        assert!(ledger.delete(id).is_err());
    }

    #[test]
    fn test_restore_puts_entry_back_in_place() {
        let ledger = InMemoryRewardLedger::new();
        let first = ledger
            .create(1, 2, RewardType::Points, Decimal::new(20, 0))
            .unwrap();
        ledger
            .create(1, 2, RewardType::Points, Decimal::new(15, 0))
            .unwrap();

        let snapshot = ledger.get(first).unwrap();
        ledger.delete(first).unwrap();
        ledger.restore(snapshot.clone()).unwrap();

        let listed = ledger.list_by_user_merchant_type(&key()).unwrap();
        assert_eq!(listed[0], snapshot);
        assert_eq!(listed.len(), 2);
    }

    #[test]
    fn test_balances_sum_per_key_sorted() {
        let ledger = InMemoryRewardLedger::new();
        ledger
            .create(2, 1, RewardType::Points, Decimal::new(4, 0))
            .unwrap();
        ledger
            .create(1, 2, RewardType::Points, Decimal::new(20, 0))
            .unwrap();
        ledger
            .create(1, 2, RewardType::Points, Decimal::new(15, 0))
            .unwrap();

        let balances = ledger.balances().unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].key, key());
        assert_eq!(balances[0].balance, Decimal::new(35, 0));
        assert_eq!(balances[1].key.user, 2);
    }
}
