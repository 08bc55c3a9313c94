//! Sliding-window rate limiting keyed by actor identity.
//!
//! One instance is shared process-wide; keys are authenticated user ids or
//! remote addresses for anonymous callers. Entries for different keys live
//! in separate dashmap shards and do not contend; calls for the same key are
//! serialized by the entry lock.

use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Default)]
pub struct RateLimiter {
    windows: DashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the request and returns `true` when the actor is still under
    /// `max_requests` within the window; a denied request is not recorded
    /// and does not extend the window.
    pub fn allow(&self, key: &str, max_requests: usize, window: Duration) -> bool {
        self.allow_at(key, max_requests, window, Instant::now())
    }

    /// Same as [`allow`](Self::allow) with an explicit clock reading.
    pub fn allow_at(
        &self,
        key: &str,
        max_requests: usize,
        window: Duration,
        now: Instant,
    ) -> bool {
        let mut entry = self.windows.entry(key.to_owned()).or_default();
        entry.retain(|&at| now.duration_since(at) < window);
        if entry.len() >= max_requests {
            return false;
        }
        entry.push(now);
        true
    }
}
