//! Minimum-interval rate limiting between provider requests.
//!
//! The limiter remembers when the last answered request finished and,
//! before the next one, blocks the calling thread until the configured
//! interval has passed.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Rate-limit policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub min_interval: Duration,
}

impl RateLimit {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);

    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval }
    }

    /// No waiting at all (tests, offline mode).
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_disabled(&self) -> bool {
        self.min_interval.is_zero()
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}

/// Tracks the last successful request under a [`RateLimit`].
#[derive(Debug)]
pub struct RateLimiter {
    policy: RateLimit,
    last_success: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(policy: RateLimit) -> Self {
        Self {
            policy,
            last_success: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> RateLimit {
        self.policy
    }

    fn last(&self) -> MutexGuard<'_, Option<Instant>> {
        // A panic while holding the lock cannot leave an Instant half-written.
        self.last_success.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Time still to wait before the next request may go out.
    pub fn remaining(&self) -> Duration {
        match *self.last() {
            Some(at) => self.policy.min_interval.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Block until the next request is allowed. Returns how long it slept.
    pub fn wait(&self) -> Duration {
        let remaining = self.remaining();
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
        remaining
    }

    /// Record an answered request; starts the next interval.
    pub fn record_success(&self) {
        if self.policy.is_disabled() {
            return;
        }
        *self.last() = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimit::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interval_is_three_seconds() {
        assert_eq!(RateLimit::default().min_interval, Duration::from_secs(3));
        assert!(RateLimit::disabled().is_disabled());
    }

    #[test]
    fn first_request_does_not_wait() {
        let limiter = RateLimiter::new(RateLimit::new(Duration::from_secs(60)));
        assert_eq!(limiter.remaining(), Duration::ZERO);
        assert_eq!(limiter.wait(), Duration::ZERO);
    }

    #[test]
    fn waits_after_success() {
        let limiter = RateLimiter::new(RateLimit::new(Duration::from_millis(30)));
        limiter.record_success();
        assert!(limiter.remaining() > Duration::ZERO);
        let start = Instant::now();
        limiter.wait();
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert_eq!(limiter.remaining(), Duration::ZERO);
    }

    #[test]
    fn disabled_never_waits() {
        let limiter = RateLimiter::new(RateLimit::disabled());
        limiter.record_success();
        assert_eq!(limiter.remaining(), Duration::ZERO);
    }

    #[test]
    fn interval_expires() {
        let limiter = RateLimiter::new(RateLimit::new(Duration::from_millis(10)));
        limiter.record_success();
        std::thread::sleep(Duration::from_millis(15));
        assert_eq!(limiter.remaining(), Duration::ZERO);
    }
}
