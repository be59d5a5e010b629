//! Reward accrual
//!
//! This module provides the AccrualEngine that turns a purchase into reward grants.
//!
//! Rules applied to every purchase:
//! - Each active campaign whose minimum amount is met grants
//!   `amount × conversion_factor × value` of the campaign's type
//! - Campaign grants are additive
//! - When no campaign qualifies, one grant of the merchant default type for
//!   `amount × conversion_factor` is written instead
//! - Grants that compute to zero are not written

use crate::core::key_locks::KeyLocks;
use crate::core::traits::{CampaignQuery, MerchantLookup, RewardLedger, TransactionStore};
use crate::core::unit_of_work::UnitOfWork;
use crate::types::{
    AccrualOutcome, Campaign, LoyaltyError, Merchant, NewTransaction, PurchaseRequest,
    RewardGrant, RewardKey, RewardType, TransactionId,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A grant computed but not yet written
#[derive(Debug, Clone, Copy, PartialEq)]
struct PlannedGrant {
    reward_type: RewardType,
    amount: Decimal,
}

/// Accrual engine
///
/// Holds its collaborators behind `Arc`s so one engine can be shared between
/// tokio tasks.
pub struct AccrualEngine {
    transactions: Arc<dyn TransactionStore>,
    campaigns: Arc<dyn CampaignQuery>,
    merchants: Arc<dyn MerchantLookup>,
    ledger: Arc<dyn RewardLedger>,
    locks: Arc<KeyLocks>,
}

impl AccrualEngine {
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        campaigns: Arc<dyn CampaignQuery>,
        merchants: Arc<dyn MerchantLookup>,
        ledger: Arc<dyn RewardLedger>,
        locks: Arc<KeyLocks>,
    ) -> Self {
        Self {
            transactions,
            campaigns,
            merchants,
            ledger,
            locks,
        }
    }

    /// Record a purchase and grant its rewards
    ///
    /// The transaction row and every grant are written in one unit of work;
    /// either all of them persist or none do.
    ///
    /// # Arguments
    ///
    /// * `purchase` - The purchase to accrue rewards for
    ///
    /// # Returns
    ///
    /// * `Ok(AccrualOutcome)` with the transaction id and the grants written
    /// * `Err(LoyaltyError)` if the purchase was rejected or a write failed
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is not strictly positive
    /// - The merchant is unknown
    /// - A reward computation overflows, or a grant would push its key's
    ///   balance past `Decimal::MAX` (nothing is written)
    /// - A collaborator fails (everything written so far is rolled back)
    pub fn process_transaction(
        &self,
        purchase: PurchaseRequest,
    ) -> Result<AccrualOutcome, LoyaltyError> {
        if purchase.amount <= Decimal::ZERO {
            return Err(LoyaltyError::invalid_amount(purchase.amount, "purchase"));
        }

        let merchant = self.merchants.get(purchase.merchant)?;
        let campaigns = self
            .campaigns
            .find_active(purchase.merchant, purchase.branch, purchase.date)?;
        let (planned, used_default) = Self::plan_grants(&purchase, &merchant, &campaigns)?;

        let keys: Vec<RewardKey> = planned
            .iter()
            .map(|grant| RewardKey::new(purchase.user, purchase.merchant, grant.reward_type))
            .collect();

        self.locks.with_locked(&keys, || -> Result<AccrualOutcome, LoyaltyError> {
            self.ensure_headroom(&purchase, &planned)?;

            let mut uow =
                UnitOfWork::begin("accrual", self.transactions.as_ref(), self.ledger.as_ref());
            let result = Self::write(&mut uow, &purchase, &planned);
            let (transaction, grants) = uow.finish(result)?;

            debug!(
                user = purchase.user,
                merchant = purchase.merchant,
                transaction,
                grants = grants.len(),
                used_default,
                "purchase accrued"
            );

            Ok(AccrualOutcome {
                transaction,
                grants,
                used_default,
            })
        })
    }

    /// Reject grants that would push a key's balance past `Decimal::MAX`
    ///
    /// Must run with the grant keys locked, before anything is written.
    fn ensure_headroom(
        &self,
        purchase: &PurchaseRequest,
        planned: &[PlannedGrant],
    ) -> Result<(), LoyaltyError> {
        let overflow = || LoyaltyError::arithmetic_overflow("accrual", purchase.user);
        let mut projected: HashMap<RewardType, Decimal> = HashMap::new();

        for grant in planned {
            let balance = match projected.get(&grant.reward_type) {
                Some(balance) => *balance,
                None => {
                    let key = RewardKey::new(purchase.user, purchase.merchant, grant.reward_type);
                    self.ledger
                        .list_by_user_merchant_type(&key)?
                        .iter()
                        .try_fold(Decimal::ZERO, |total, reward| {
                            total.checked_add(reward.amount).ok_or_else(overflow)
                        })?
                }
            };
            let balance = balance.checked_add(grant.amount).ok_or_else(overflow)?;
            projected.insert(grant.reward_type, balance);
        }

        Ok(())
    }

    fn write(
        uow: &mut UnitOfWork<'_>,
        purchase: &PurchaseRequest,
        planned: &[PlannedGrant],
    ) -> Result<(TransactionId, Vec<RewardGrant>), LoyaltyError> {
        let transaction = uow.create_transaction(NewTransaction {
            user: purchase.user,
            merchant: purchase.merchant,
            branch: purchase.branch,
            amount: purchase.amount,
            date: purchase.date,
        })?;

        let mut grants = Vec::with_capacity(planned.len());
        for grant in planned {
            let reward = uow.create_reward(
                purchase.user,
                purchase.merchant,
                grant.reward_type,
                grant.amount,
            )?;
            debug!(
                reward,
                reward_type = %grant.reward_type,
                amount = %grant.amount,
                "reward granted"
            );
            grants.push(RewardGrant {
                reward,
                reward_type: grant.reward_type,
                amount: grant.amount,
            });
        }

        Ok((transaction, grants))
    }

    /// Compute the grants for a purchase without writing anything
    ///
    /// Returns the non-zero grants in campaign order and whether the merchant
    /// default was used.
    fn plan_grants(
        purchase: &PurchaseRequest,
        merchant: &Merchant,
        campaigns: &[Campaign],
    ) -> Result<(Vec<PlannedGrant>, bool), LoyaltyError> {
        let base = purchase
            .amount
            .checked_mul(merchant.conversion_factor)
            .ok_or_else(|| LoyaltyError::arithmetic_overflow("accrual", purchase.user))?;

        let mut planned = Vec::new();
        let mut qualified = 0usize;

        for campaign in campaigns
            .iter()
            .filter(|campaign| campaign.qualifies(purchase.amount))
        {
            qualified += 1;
            let amount = base
                .checked_mul(campaign.value)
                .ok_or_else(|| LoyaltyError::arithmetic_overflow("accrual", purchase.user))?;
            planned.push(PlannedGrant {
                reward_type: campaign.reward_type,
                amount,
            });
        }

        let used_default = qualified == 0;
        if used_default {
            planned.push(PlannedGrant {
                reward_type: merchant.default_reward_type,
                amount: base,
            });
        }

        planned.retain(|grant| !grant.amount.is_zero());
        Ok((planned, used_default))
    }
}
