// src/crawl/limiter.rs
// =============================================================================
// Caps how many pages are fetched and parsed at the same time.
//
// A Slot is held for the fetch and parse of one page; dropping it frees the
// slot for the next waiting task. Closing the limiter wakes every waiter
// with None, which is how a cancelled crawl stops tasks blocked here.
// =============================================================================

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Fixed-capacity pool of fetch slots. A capacity of 0 means unbounded.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Option<Arc<Semaphore>>,
}

impl ConcurrencyLimiter {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: (capacity > 0).then(|| Arc::new(Semaphore::new(capacity))),
        }
    }

    /// Waits for a free slot. Returns `None` once the pool has been closed.
    pub async fn acquire(&self) -> Option<Slot> {
        let permit = match &self.semaphore {
            Some(semaphore) => Some(Arc::clone(semaphore).acquire_owned().await.ok()?),
            None => None,
        };
        Some(Slot { _permit: permit })
    }

    /// Free slots right now, `None` when unbounded.
    pub fn available(&self) -> Option<usize> {
        self.semaphore.as_ref().map(|s| s.available_permits())
    }

    /// Stops handing out slots; waiting and future `acquire` calls get `None`.
    /// Slots already held stay valid until dropped.
    pub fn close(&self) {
        if let Some(semaphore) = &self.semaphore {
            semaphore.close();
        }
    }
}

/// A held slot, released when dropped.
#[derive(Debug)]
pub struct Slot {
    _permit: Option<OwnedSemaphorePermit>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_acquire_blocks_when_saturated() {
        let limiter = ConcurrencyLimiter::new(2);
        let _a = limiter.acquire().await.unwrap();
        let b = limiter.acquire().await.unwrap();
        assert_eq!(limiter.available(), Some(0));

        let blocked = timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(blocked.is_err(), "third acquire should wait");

        drop(b);
        let c = timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(c.is_ok(), "released slot should be reusable");
    }

    #[tokio::test]
    async fn test_zero_capacity_is_unbounded() {
        let limiter = ConcurrencyLimiter::new(0);
        let mut slots = Vec::new();
        for _ in 0..1000 {
            slots.push(limiter.acquire().await.unwrap());
        }
        assert_eq!(limiter.available(), None);
    }

    #[tokio::test]
    async fn test_close_wakes_waiters() {
        let limiter = ConcurrencyLimiter::new(1);
        let _held = limiter.acquire().await.unwrap();

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await.is_none() })
        };
        tokio::task::yield_now().await;
        limiter.close();

        assert!(waiter.await.unwrap());
    }
}
