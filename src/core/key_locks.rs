//! Per-key mutual exclusion for reward balances
//!
//! Redemption reads a balance, checks it, then deducts. Two redemptions for the
//! same (user, merchant, type) interleaving between the read and the deduct
//! would both pass the check and over-redeem. `KeyLocks` hands out one mutex
//! per [`RewardKey`] so that read-validate-deduct runs as one critical section.
//!
//! Accrual takes the locks for the keys it grants to as well, so a rollback of
//! a grant can never race with a redemption consuming it.

use crate::types::RewardKey;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Registry of per-key mutexes
///
/// Mutexes are created lazily and kept for the lifetime of the registry.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: DashMap<RewardKey, Arc<Mutex<()>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn mutex_for(&self, key: RewardKey) -> Arc<Mutex<()>> {
        // Clone the Arc out so the DashMap shard is released before locking
        Arc::clone(self.locks.entry(key).or_default().value())
    }

    /// Run `f` while holding the locks of every key in `keys`
    ///
    /// Keys are locked in sorted order with duplicates removed, so callers
    /// locking overlapping key sets cannot deadlock each other.
    pub fn with_locked<T>(&self, keys: &[RewardKey], f: impl FnOnce() -> T) -> T {
        let mut keys = keys.to_vec();
        keys.sort_unstable();
        keys.dedup();

        let mutexes: Vec<Arc<Mutex<()>>> =
            keys.into_iter().map(|key| self.mutex_for(key)).collect();
        let _guards: Vec<_> = mutexes.iter().map(|mutex| mutex.lock()).collect();

        f()
    }

    /// Number of keys a mutex has been created for
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RewardType;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_with_locked_returns_closure_value() {
        let locks = KeyLocks::new();
        let key = RewardKey::new(1, 2, RewardType::Points);

        assert_eq!(locks.with_locked(&[key], || 42), 42);
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn test_duplicate_keys_do_not_self_deadlock() {
        let locks = KeyLocks::new();
        let key = RewardKey::new(1, 2, RewardType::Points);

        let value = locks.with_locked(&[key, key], || "done");
        assert_eq!(value, "done");
    }

    #[test]
    fn test_same_key_is_mutually_exclusive() {
        let locks = Arc::new(KeyLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));
        let key = RewardKey::new(1, 2, RewardType::Points);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    for _ in 0..100 {
                        locks.with_locked(&[key], || {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_inside.fetch_max(now, Ordering::SeqCst);
                            inside.fetch_sub(1, Ordering::SeqCst);
                        });
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_overlapping_key_sets_do_not_deadlock() {
        let locks = Arc::new(KeyLocks::new());
        let points = RewardKey::new(1, 2, RewardType::Points);
        let cashback = RewardKey::new(1, 2, RewardType::Cashback);

        let forward = {
            let locks = Arc::clone(&locks);
            thread::spawn(move || {
                for _ in 0..500 {
                    locks.with_locked(&[points, cashback], || ());
                }
            })
        };
        let backward = {
            let locks = Arc::clone(&locks);
            thread::spawn(move || {
                for _ in 0..500 {
                    locks.with_locked(&[cashback, points], || ());
                }
            })
        };

        forward.join().unwrap();
        backward.join().unwrap();
    }
}
