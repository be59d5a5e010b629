//! Thread-safe in-memory transaction store
//!
//! Purchase transactions are kept in a `DashMap` keyed by a store-assigned,
//! monotonically increasing id. The map is sharded internally, so concurrent
//! accrual for different users does not contend on a global lock.

use crate::core::traits::TransactionStore;
use crate::types::{LoyaltyError, NewTransaction, Transaction, TransactionId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory [`TransactionStore`]
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    /// Persisted transactions by id
    transactions: DashMap<TransactionId, Transaction>,

    /// Last id handed out; ids start at 1
    last_id: AtomicU64,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of transactions currently stored
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl TransactionStore for InMemoryTransactionStore {
    fn create(&self, transaction: NewTransaction) -> Result<TransactionId, LoyaltyError> {
        let id = self.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.transactions
            .insert(id, Transaction::from_new(id, transaction));
        Ok(id)
    }

    fn get(&self, id: TransactionId) -> Result<Transaction, LoyaltyError> {
        self.transactions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LoyaltyError::not_found("transaction", id))
    }

    fn delete(&self, id: TransactionId) -> Result<(), LoyaltyError> {
        self.transactions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| LoyaltyError::not_found("transaction", id))
    }
}
