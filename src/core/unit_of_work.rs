//! Scoped, all-or-nothing writes across the transaction store and reward ledger
//!
//! A [`UnitOfWork`] performs writes immediately and journals how to undo each
//! one. Committing discards the journal. Rolling back, or dropping the unit
//! without committing, replays the undo steps newest first:
//!
//! | write               | undo                         |
//! |---------------------|------------------------------|
//! | create transaction  | delete the transaction       |
//! | create reward       | delete the reward            |
//! | update reward       | restore the prior snapshot   |
//! | delete reward       | restore the prior snapshot   |
//!
//! Isolation comes from the caller holding the relevant [`KeyLocks`] for the
//! whole unit; the unit itself only guarantees atomicity.
//!
//! [`KeyLocks`]: crate::core::key_locks::KeyLocks

use crate::core::traits::{RewardLedger, TransactionStore};
use crate::types::{
    LoyaltyError, MerchantId, NewTransaction, Reward, RewardId, RewardType, TransactionId,
    UserId,
};
use rust_decimal::Decimal;
use tracing::{debug, error, warn};

/// Undo step for one journaled write
#[derive(Debug, Clone, PartialEq)]
enum Compensation {
    DeleteTransaction(TransactionId),
    DeleteReward(RewardId),
    RestoreReward(Reward),
}

/// Journal of writes that are committed or rolled back together
pub struct UnitOfWork<'a> {
    operation: &'static str,
    transactions: &'a dyn TransactionStore,
    ledger: &'a dyn RewardLedger,
    journal: Vec<Compensation>,
}

impl<'a> UnitOfWork<'a> {
    /// Start a unit of work over the given collaborators
    pub fn begin(
        operation: &'static str,
        transactions: &'a dyn TransactionStore,
        ledger: &'a dyn RewardLedger,
    ) -> Self {
        Self {
            operation,
            transactions,
            ledger,
            journal: Vec::new(),
        }
    }

    /// Persist a transaction
    pub fn create_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<TransactionId, LoyaltyError> {
        let id = self.transactions.create(transaction)?;
        self.journal.push(Compensation::DeleteTransaction(id));
        Ok(id)
    }

    /// Create a reward grant
    pub fn create_reward(
        &mut self,
        user: UserId,
        merchant: MerchantId,
        reward_type: RewardType,
        amount: Decimal,
    ) -> Result<RewardId, LoyaltyError> {
        let id = self.ledger.create(user, merchant, reward_type, amount)?;
        self.journal.push(Compensation::DeleteReward(id));
        Ok(id)
    }

    /// Reduce a grant to `new_amount`; `original` is its state before the write
    pub fn update_reward(
        &mut self,
        original: &Reward,
        new_amount: Decimal,
    ) -> Result<(), LoyaltyError> {
        self.ledger.update(original.id, new_amount)?;
        self.journal
            .push(Compensation::RestoreReward(original.clone()));
        Ok(())
    }

    /// Delete a grant; `original` is its state before the write
    pub fn delete_reward(&mut self, original: &Reward) -> Result<(), LoyaltyError> {
        self.ledger.delete(original.id)?;
        self.journal
            .push(Compensation::RestoreReward(original.clone()));
        Ok(())
    }

    /// Number of writes journaled so far
    pub fn pending(&self) -> usize {
        self.journal.len()
    }

    /// Keep every write
    pub fn commit(mut self) {
        debug!(
            operation = self.operation,
            writes = self.journal.len(),
            "unit of work committed"
        );
        self.journal.clear();
    }

    /// Undo every write, newest first
    ///
    /// All undo steps are attempted even if one fails; the first failure is
    /// returned.
    pub fn rollback(mut self) -> Result<(), LoyaltyError> {
        self.undo()
    }

    /// Commit on `Ok`, roll back on `Err`, and pass the result through
    ///
    /// A failed rollback is reported as a consistency error naming both the
    /// original failure and the rollback failure.
    pub fn finish<T>(self, result: Result<T, LoyaltyError>) -> Result<T, LoyaltyError> {
        match result {
            Ok(value) => {
                self.commit();
                Ok(value)
            }
            Err(err) => {
                let operation = self.operation;
                match self.rollback() {
                    Ok(()) => Err(err),
                    Err(rollback_err) => Err(LoyaltyError::consistency(
                        operation,
                        format!("rollback after '{}' failed: {}", err, rollback_err),
                    )),
                }
            }
        }
    }

    fn undo(&mut self) -> Result<(), LoyaltyError> {
        if self.journal.is_empty() {
            return Ok(());
        }

        warn!(
            operation = self.operation,
            writes = self.journal.len(),
            "rolling back unit of work"
        );

        let mut first_failure = None;
        while let Some(step) = self.journal.pop() {
            let result = match &step {
                Compensation::DeleteTransaction(id) => self.transactions.delete(*id),
                Compensation::DeleteReward(id) => self.ledger.delete(*id),
                Compensation::RestoreReward(reward) => self.ledger.restore(reward.clone()),
            };
            if let Err(err) = result {
                error!(operation = self.operation, ?step, %err, "undo step failed");
                first_failure.get_or_insert(err);
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        if !self.journal.is_empty() {
            // Dropped without commit or rollback; failures are already logged
            let _ = self.undo();
        }
    }
}
