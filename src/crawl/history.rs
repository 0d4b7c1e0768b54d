// src/crawl/history.rs
// =============================================================================
// The set of addresses a crawl has already claimed.
//
// Many pages usually link to the same address, and those pages are processed
// by different tasks at the same time. `try_admit` is the single place where
// they race: checking and inserting happen as one atomic step, so exactly
// one task wins each address and fetches it.
// =============================================================================

use dashmap::DashSet;

/// Visited addresses of one crawl. Grows monotonically.
#[derive(Debug, Default)]
pub struct History {
    visited: DashSet<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `key`. Returns `true` only for the first caller.
    pub fn try_admit(&self, key: &str) -> bool {
        self.visited.insert(key.to_owned())
    }

    /// All admitted addresses, in no particular order.
    pub fn snapshot(&self) -> Vec<String> {
        self.visited.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_second_admission_refused() {
        let history = History::new();
        assert!(history.try_admit("https://a.test/"));
        assert!(!history.try_admit("https://a.test/"));
        assert!(history.try_admit("https://a.test/x"));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_snapshot_contains_every_key() {
        let history = History::new();
        for key in ["https://a.test/1", "https://a.test/2", "https://a.test/3"] {
            history.try_admit(key);
        }
        let mut keys = history.snapshot();
        keys.sort();
        assert_eq!(keys, vec!["https://a.test/1", "https://a.test/2", "https://a.test/3"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_admission_has_one_winner() {
        let history = Arc::new(History::new());

        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let history = Arc::clone(&history);
                tokio::spawn(async move { history.try_admit("https://a.test/contested") })
            })
            .collect();

        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(history.len(), 1);
    }
}
