//! Per-caller request throttling.
//!
//! The limiter is a trait so handlers and tests can inject their own policy;
//! the default is a fixed-window counter keyed by caller identity.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// Denied; the caller may retry after this many seconds.
    Denied { retry_after_secs: u64 },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

pub trait RateLimiter: Send + Sync {
    /// Record a request from `key` and decide whether it may proceed.
    fn allow(&self, key: &str) -> Decision;
}

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counter: up to `max_requests` per `window` per key, counter
/// reset when the window elapses. Coarser than a sliding window (a burst can
/// straddle the boundary) but cheap and predictable.
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self { max_requests, window, windows: Mutex::new(HashMap::new()) }
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn allow(&self, key: &str) -> Decision {
        let now = Instant::now();
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            // A poisoned lock means a panic elsewhere; fail open rather than
            // turning the limiter into an outage
            Err(poisoned) => poisoned.into_inner(),
        };

        let window = windows
            .entry(key.to_string())
            .or_insert_with(|| Window { started: now, count: 0 });

        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.max_requests {
            let elapsed = now.duration_since(window.started);
            let remaining = self.window.saturating_sub(elapsed);
            return Decision::Denied { retry_after_secs: remaining.as_secs().max(1) };
        }

        window.count += 1;
        Decision::Allowed
    }
}

/// Limiter that never denies, for routes and tests that opt out.
pub struct NoopLimiter;

impl RateLimiter for NoopLimiter {
    fn allow(&self, _key: &str) -> Decision {
        Decision::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_denies() {
        let limiter = FixedWindowLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.allow("1.2.3.4").is_allowed());
        }
        match limiter.allow("1.2.3.4") {
            Decision::Denied { retry_after_secs } => assert!(retry_after_secs >= 1),
            Decision::Allowed => panic!("fourth request should be denied"),
        }
    }

    #[test]
    fn keys_are_tracked_independently() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.allow("1.2.3.4").is_allowed());
        assert!(limiter.allow("5.6.7.8").is_allowed());
        assert!(!limiter.allow("1.2.3.4").is_allowed());
    }

    #[test]
    fn window_resets_after_elapse() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_millis(10));
        assert!(limiter.allow("k").is_allowed());
        assert!(!limiter.allow("k").is_allowed());
        std::thread::sleep(Duration::from_millis(15));
        assert!(limiter.allow("k").is_allowed());
    }

    #[test]
    fn noop_limiter_never_denies() {
        let limiter = NoopLimiter;
        for _ in 0..100 {
            assert!(limiter.allow("k").is_allowed());
        }
    }
}
