//! Per-profile write serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Async locks keyed by elderly ID.
///
/// Writers that replace a profile's plans or family code hold the guard for
/// the whole statement sequence, so two saves for the same profile never
/// interleave. Different profiles do not contend.
#[derive(Debug, Clone, Default)]
pub struct KeyedLocks {
    inner: Arc<Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: i64) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop entries nobody holds or waits on.
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(key).or_default().clone()
        };
        entry.lock_owned().await
    }

    /// Number of keys currently tracked.
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_waits() {
        let locks = KeyedLocks::new();
        let guard = locks.lock(1).await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _guard = contender.lock(1).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        waiting.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_keys_do_not_contend() {
        let locks = KeyedLocks::new();
        let _one = locks.lock(1).await;
        let _two = locks.lock(2).await;
        assert_eq!(locks.tracked(), 2);
    }

    #[tokio::test]
    async fn test_idle_entries_are_pruned() {
        let locks = KeyedLocks::new();
        drop(locks.lock(1).await);
        drop(locks.lock(2).await);
        let _three = locks.lock(3).await;
        assert_eq!(locks.tracked(), 1);
    }
}
