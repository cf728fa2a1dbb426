//! Per-sender turn serialization.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One lock per sender so turns of the same user never interleave.
///
/// Entries are dropped once no turn holds or awaits them.
#[derive(Default)]
pub struct TurnLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TurnLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sender's lock, created on first use. Pass it back to [`release`](Self::release).
    pub async fn acquire(&self, sender_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(sender_id.to_string()).or_default().clone()
    }

    pub async fn release(&self, sender_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // One reference in the map, one owned here
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(sender_id);
        }
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_finished_turn_forgets_sender() {
        let turns = TurnLocks::new();
        for sender in ["1", "2", "3"] {
            let lock = turns.acquire(sender).await;
            drop(lock.lock().await);
            turns.release(sender, lock).await;
        }
        assert!(turns.is_empty().await);
    }

    #[tokio::test]
    async fn test_waiting_turn_keeps_lock() {
        let turns = TurnLocks::new();
        let first = turns.acquire("1").await;
        let second = turns.acquire("1").await;
        assert!(Arc::ptr_eq(&first, &second));

        turns.release("1", first).await;
        assert_eq!(turns.len().await, 1);

        // Same lock handed out while the second turn is still pending
        let third = turns.acquire("1").await;
        assert!(Arc::ptr_eq(&second, &third));

        turns.release("1", second).await;
        assert_eq!(turns.len().await, 1);
        turns.release("1", third).await;
        assert!(turns.is_empty().await);
    }
}
