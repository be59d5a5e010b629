//! Reward redemption
//!
//! This module provides the RedemptionEngine that deducts a requested amount
//! from a user's grants for one merchant and reward type.
//!
//! Grants are consumed oldest first: a grant no larger than what is still owed
//! is deleted, otherwise it is reduced and depletion stops. The whole
//! read-check-deduct sequence runs under the key's lock and inside one unit of
//! work.

use crate::core::key_locks::KeyLocks;
use crate::core::traits::{RewardLedger, TransactionStore};
use crate::core::unit_of_work::UnitOfWork;
use crate::types::{LoyaltyError, RedemptionOutcome, RedemptionRequest, Reward, RewardKey};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Redemption engine
pub struct RedemptionEngine {
    transactions: Arc<dyn TransactionStore>,
    ledger: Arc<dyn RewardLedger>,
    locks: Arc<KeyLocks>,
}

impl RedemptionEngine {
    /// Create a redemption engine
    ///
    /// The transaction store is only handed to units of work; redemption never
    /// writes a transaction row.
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        ledger: Arc<dyn RewardLedger>,
        locks: Arc<KeyLocks>,
    ) -> Self {
        Self {
            transactions,
            ledger,
            locks,
        }
    }

    /// Redeem `amount` of a user's rewards at one merchant
    ///
    /// # Arguments
    ///
    /// * `request` - Who redeems, where, how much and of which type
    ///
    /// # Returns
    ///
    /// * `Ok(RedemptionOutcome)` describing which grants were consumed
    /// * `Err(LoyaltyError)` if the redemption was rejected or a write failed
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is not strictly positive
    /// - The grants for the key sum to less than the amount (nothing is changed)
    /// - A ledger write fails (every grant touched so far is restored)
    /// - Depletion ends with an amount still owed
    pub fn redeem_rewards(
        &self,
        request: RedemptionRequest,
    ) -> Result<RedemptionOutcome, LoyaltyError> {
        if request.amount <= Decimal::ZERO {
            return Err(LoyaltyError::invalid_amount(request.amount, "redemption"));
        }

        let key = RewardKey::new(request.user, request.merchant, request.reward_type);

        self.locks.with_locked(&[key], || -> Result<RedemptionOutcome, LoyaltyError> {
            let entries = self.ledger.list_by_user_merchant_type(&key)?;
            let available = Self::sum(&entries, &key)?;

            if available < request.amount {
                return Err(LoyaltyError::insufficient_rewards(
                    request.user,
                    request.merchant,
                    request.reward_type,
                    available,
                    request.amount,
                ));
            }

            let mut uow =
                UnitOfWork::begin("redemption", self.transactions.as_ref(), self.ledger.as_ref());
            let result = Self::deplete(&mut uow, &entries, request.amount, &key);
            let outcome = uow.finish(result)?;

            debug!(
                %key,
                redeemed = %outcome.redeemed,
                deleted = outcome.deleted.len(),
                reduced = outcome.reduced.is_some(),
                "rewards redeemed"
            );
            Ok(outcome)
        })
    }

    fn sum(entries: &[Reward], key: &RewardKey) -> Result<Decimal, LoyaltyError> {
        entries.iter().try_fold(Decimal::ZERO, |total, reward| {
            total
                .checked_add(reward.amount)
                .ok_or_else(|| LoyaltyError::arithmetic_overflow("redemption", key.user))
        })
    }

    fn deplete(
        uow: &mut UnitOfWork<'_>,
        entries: &[Reward],
        amount: Decimal,
        key: &RewardKey,
    ) -> Result<RedemptionOutcome, LoyaltyError> {
        let mut remaining = amount;
        let mut deleted = Vec::new();
        let mut reduced = None;

        for reward in entries {
            if remaining <= Decimal::ZERO {
                break;
            }

            if reward.amount <= remaining {
                uow.delete_reward(reward)?;
                remaining = remaining
                    .checked_sub(reward.amount)
                    .ok_or_else(|| LoyaltyError::arithmetic_overflow("redemption", key.user))?;
                deleted.push(reward.id);
                debug!(reward = reward.id, consumed = %reward.amount, "grant consumed");
            } else {
                let left = reward
                    .amount
                    .checked_sub(remaining)
                    .ok_or_else(|| LoyaltyError::arithmetic_overflow("redemption", key.user))?;
                uow.update_reward(reward, left)?;
                reduced = Some((reward.id, left));
                debug!(reward = reward.id, consumed = %remaining, left = %left, "grant reduced");
                remaining = Decimal::ZERO;
            }
        }

        if remaining > Decimal::ZERO {
            return Err(LoyaltyError::consistency(
                "redemption",
                format!("{} of {} still owed for {} after depletion", remaining, amount, key),
            ));
        }

        Ok(RedemptionOutcome {
            redeemed: amount,
            deleted,
            reduced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{InMemoryRewardLedger, InMemoryTransactionStore};
    use crate::core::test_support::FlakyLedger;
    use crate::types::{ErrorKind, RewardType};
    use rstest::rstest;
    use std::str::FromStr;
    use std::thread;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn key() -> RewardKey {
        RewardKey::new(1, 2, RewardType::Points)
    }

    fn request(amount: &str) -> RedemptionRequest {
        RedemptionRequest {
            user: 1,
            merchant: 2,
            amount: dec(amount),
            reward_type: RewardType::Points,
        }
    }

    fn engine(ledger: Arc<dyn RewardLedger>) -> RedemptionEngine {
        RedemptionEngine::new(
            Arc::new(InMemoryTransactionStore::new()),
            ledger,
            Arc::new(KeyLocks::new()),
        )
    }

    fn seed(ledger: &dyn RewardLedger, amounts: &[&str]) -> Vec<u64> {
        amounts
            .iter()
            .map(|amount| {
                ledger
                    .create(1, 2, RewardType::Points, dec(amount))
                    .unwrap()
            })
            .collect()
    }

    fn remaining(ledger: &dyn RewardLedger) -> Vec<Decimal> {
        ledger
            .list_by_user_merchant_type(&key())
            .unwrap()
            .into_iter()
            .map(|reward| reward.amount)
            .collect()
    }

    #[test]
    fn test_exact_amount_consumes_every_grant() {
        let ledger = Arc::new(InMemoryRewardLedger::new());
        let ids = seed(ledger.as_ref(), &["20", "15"]);

        let outcome = engine(ledger.clone()).redeem_rewards(request("35")).unwrap();

        assert_eq!(outcome.deleted, ids);
        assert_eq!(outcome.reduced, None);
        assert!(remaining(ledger.as_ref()).is_empty());
        assert!(ledger.balances().unwrap().is_empty());
    }

    #[test]
    fn test_partial_depletion_reduces_last_grant() {
        let ledger = Arc::new(InMemoryRewardLedger::new());
        let ids = seed(ledger.as_ref(), &["20", "15"]);

        let outcome = engine(ledger.clone()).redeem_rewards(request("30")).unwrap();

        assert_eq!(outcome.redeemed, dec("30"));
        assert_eq!(outcome.deleted, vec![ids[0]]);
        assert_eq!(outcome.reduced, Some((ids[1], dec("5"))));
        assert_eq!(remaining(ledger.as_ref()), vec![dec("5")]);
    }

    #[test]
    fn test_insufficient_rewards_changes_nothing() {
        let ledger = Arc::new(InMemoryRewardLedger::new());
        seed(ledger.as_ref(), &["20"]);
        let before = ledger.balances().unwrap();

        let err = engine(ledger.clone())
            .redeem_rewards(request("30"))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InsufficientRewards);
        assert!(matches!(
            err,
            LoyaltyError::InsufficientRewards { available, requested, .. }
                if available == dec("20") && requested == dec("30")
        ));
        assert_eq!(ledger.balances().unwrap(), before);
    }

    #[test]
    fn test_other_types_and_merchants_are_not_touched() {
        let ledger = Arc::new(InMemoryRewardLedger::new());
        seed(ledger.as_ref(), &["10"]);
        ledger
            .create(1, 2, RewardType::Cashback, dec("50"))
            .unwrap();
        ledger.create(1, 7, RewardType::Points, dec("50")).unwrap();

        let err = engine(ledger.clone())
            .redeem_rewards(request("11"))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InsufficientRewards);
        assert_eq!(ledger.len(), 3);
    }

    #[rstest]
    #[case::zero("0")]
    #[case::negative("-1")]
    fn test_non_positive_amount_rejected(#[case] amount: &str) {
        let ledger = Arc::new(InMemoryRewardLedger::new());
        seed(ledger.as_ref(), &["10"]);

        let err = engine(ledger.clone())
            .redeem_rewards(request(amount))
            .unwrap_err();

        assert!(matches!(err, LoyaltyError::InvalidAmount { .. }));
        assert_eq!(remaining(ledger.as_ref()), vec![dec("10")]);
    }

    #[rstest]
    #[case::second_delete_fails(2, "35")]
    #[case::final_update_fails(2, "30")]
    #[case::first_write_fails(1, "30")]
    fn test_failed_write_restores_every_grant(#[case] failing_write: usize, #[case] amount: &str) {
        let ledger = Arc::new(FlakyLedger::default());
        seed(ledger.as_ref(), &["20", "15"]);
        let before = ledger.list_by_user_merchant_type(&key()).unwrap();
        ledger.arm(failing_write);

        let err = engine(ledger.clone())
            .redeem_rewards(request(amount))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert_eq!(ledger.list_by_user_merchant_type(&key()).unwrap(), before);
    }

    #[test]
    fn test_concurrent_redemptions_never_over_redeem() {
        let ledger = Arc::new(InMemoryRewardLedger::new());
        seed(ledger.as_ref(), &["10", "10", "10", "10", "10"]);
        let engine = Arc::new(engine(ledger.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || engine.redeem_rewards(request("7")).is_ok())
            })
            .collect();

        let succeeded = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count();

        // 50 available, 7 per redemption
        assert_eq!(succeeded, 7);
        let left: Decimal = remaining(ledger.as_ref()).into_iter().sum();
        assert_eq!(left, dec("1"));
    }

    #[test]
    fn test_depletion_short_of_amount_is_a_consistency_error() {
        // Entries read under the lock no longer cover the amount
        let transactions = InMemoryTransactionStore::new();
        let ledger = InMemoryRewardLedger::new();
        seed(&ledger, &["20", "15"]);
        let entries = ledger.list_by_user_merchant_type(&key()).unwrap();

        let mut uow = UnitOfWork::begin("redemption", &transactions, &ledger);
        let result = RedemptionEngine::deplete(&mut uow, &entries, dec("50"), &key());
        assert_eq!(uow.pending(), 2);
        let err = uow.finish(result).unwrap_err();

        assert!(matches!(err, LoyaltyError::Consistency { .. }));
        assert_eq!(err.kind(), ErrorKind::Consistency);
        assert!(err.to_string().contains("15 of 50 still owed"));
        assert_eq!(ledger.list_by_user_merchant_type(&key()).unwrap(), entries);
    }
}
