//! Supersession tracking for in-flight requests.
//!
//! When a screen reloads the same data twice in quick succession, only the
//! most recent response may be applied. Each logical key (for example
//! `"dashboard"`) gets a monotonically increasing ticket; a response whose
//! ticket is no longer the newest for its key is discarded.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

/// Identifies one request for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    key: String,
    seq: u64,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: Mutex<HashMap<String, u64>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request for `key`, superseding any earlier one.
    pub fn begin(&self, key: &str) -> Ticket {
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        let seq = latest.entry(key.to_string()).or_insert(0);
        *seq += 1;
        Ticket {
            key: key.to_string(),
            seq: *seq,
        }
    }

    /// `true` while no newer request for the same key has begun.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        let latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        latest.get(&ticket.key) == Some(&ticket.seq)
    }

    /// Await `fut` and return its output, or `None` if a newer request for
    /// `key` began while it was pending.
    pub async fn run_latest<F, T>(&self, key: &str, fut: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let ticket = self.begin(key);
        let output = fut.await;
        if self.is_current(&ticket) {
            Some(output)
        } else {
            tracing::debug!(key, seq = ticket.seq, "Discarding superseded response");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn newer_ticket_supersedes_older() {
        let tracker = RequestTracker::new();
        let first = tracker.begin("dashboard");
        assert!(tracker.is_current(&first));
        let second = tracker.begin("dashboard");
        assert!(!tracker.is_current(&first));
        assert!(tracker.is_current(&second));
        assert!(second.seq() > first.seq());
    }

    #[test]
    fn keys_are_independent() {
        let tracker = RequestTracker::new();
        let a = tracker.begin("objectives");
        let _b = tracker.begin("team");
        assert!(tracker.is_current(&a));
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let tracker = RequestTracker::new();
        let slow = tracker.run_latest("metrics", async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            "slow"
        });
        let fast = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            tracker.run_latest("metrics", async { "fast" }).await
        };
        let (slow, fast) = tokio::join!(slow, fast);
        assert_eq!(slow, None);
        assert_eq!(fast, Some("fast"));
    }

    #[tokio::test]
    async fn sole_request_is_kept() {
        let tracker = RequestTracker::new();
        assert_eq!(tracker.run_latest("k", async { 7 }).await, Some(7));
    }
}
