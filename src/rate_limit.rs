//! Per-user fixed-window rate limiting
//!
//! The limiter is an injected abstraction rather than a module-level
//! singleton so deployments can swap the in-memory store for a shared
//! external counter. The bundled implementation is per-process: in a
//! multi-instance deployment the effective limit is the configured limit
//! multiplied by instance count, and a restart resets all counters.

use std::time::Duration;
use std::time::Instant;

use dashmap::DashMap;

use crate::config::RateLimitConfig;

/// Decides whether a user's request may proceed
pub trait RateLimiter: Send + Sync {
    /// Record a request attempt for `user_id`; returns false when the
    /// user is over budget for the current window
    fn check(&self, user_id: &str) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    window_started: Instant,
}

/// In-memory fixed-window limiter keyed by user id
pub struct InMemoryRateLimiter {
    max_requests: u32,
    window: Duration,
    entries: DashMap<String, WindowEntry>,
}

impl InMemoryRateLimiter {
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: DashMap::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check(&self, user_id: &str) -> bool {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(user_id.to_string())
            .or_insert(WindowEntry {
                count: 0,
                window_started: now,
            });

        if now.duration_since(entry.window_started) > self.window {
            entry.count = 0;
            entry.window_started = now;
        }

        if entry.count >= self.max_requests {
            return false;
        }

        entry.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_max_then_rejects() {
        let limiter = InMemoryRateLimiter::new(15, Duration::from_secs(60));

        for _ in 0..15 {
            assert!(limiter.check("alice"));
        }
        assert!(!limiter.check("alice"));
    }

    #[test]
    fn test_limits_are_per_user() {
        let limiter = InMemoryRateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check("alice"));
        assert!(!limiter.check("alice"));
        assert!(limiter.check("bob"));
    }

    #[test]
    fn test_window_elapse_resets_counter() {
        let limiter = InMemoryRateLimiter::new(2, Duration::from_millis(50));

        assert!(limiter.check("alice"));
        assert!(limiter.check("alice"));
        assert!(!limiter.check("alice"));

        std::thread::sleep(Duration::from_millis(80));
        assert!(limiter.check("alice"));
    }
}
