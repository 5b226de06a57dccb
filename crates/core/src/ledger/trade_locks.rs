//! Per-(user, symbol) serialization of trades inside one process.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockKey = (String, String);

/// Keyed async mutexes.
///
/// Trades on different pairs proceed in parallel; trades on the same pair
/// queue behind each other. Entries are dropped once nobody holds or waits
/// on them.
#[derive(Clone, Default)]
pub struct TradeLocks {
    locks: Arc<DashMap<LockKey, Arc<Mutex<()>>>>,
}

/// Held for the duration of one trade.
pub struct TradeGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: LockKey,
    locks: Arc<DashMap<LockKey, Arc<Mutex<()>>>>,
}

impl TradeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: &str, symbol: &str) -> TradeGuard {
        let key = (user_id.to_string(), symbol.to_string());
        // Clone out of the map so the shard lock is released before awaiting.
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        TradeGuard {
            guard: Some(lock.lock_owned().await),
            key,
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of pairs with a live lock entry.
    pub fn active_keys(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for TradeGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left: no holder, no waiter.
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_entries_are_released() {
        let locks = TradeLocks::new();
        {
            let _guard = locks.acquire("u1", "AAPL").await;
            assert_eq!(locks.active_keys(), 1);
        }
        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_key_is_exclusive() {
        let locks = TradeLocks::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let inside = inside.clone();
                let max_seen = max_seen.clone();
                tokio::spawn(async move {
                    let _guard = locks.acquire("u1", "AAPL").await;
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = TradeLocks::new();
        let _a = locks.acquire("u1", "AAPL").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("u1", "MSFT")).await;
        assert!(b.is_ok());
    }
}
