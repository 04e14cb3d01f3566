//! Transport-level rate limiting for the auth endpoints.
//!
//! This is distinct from the OTP engine's per-phone issuance cooldown: these
//! limits bound how often a single client may hit an endpoint at all. The
//! sliding-window limiter is process-local; a multi-instance deployment
//! would swap in a shared implementation behind the same trait.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RateLimitAction {
    SendOtp,
    VerifyOtp,
    Register,
    Login,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

pub trait RateLimiter: Send + Sync {
    fn check_ip(&self, ip: Option<&str>, action: RateLimitAction) -> RateLimitDecision;
    fn check_identity(&self, identity: &str, action: RateLimitAction) -> RateLimitDecision;
}

#[derive(Clone, Debug)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check_ip(&self, _ip: Option<&str>, _action: RateLimitAction) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }

    fn check_identity(&self, _identity: &str, _action: RateLimitAction) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }
}

/// In-memory sliding-window limiter.
#[derive(Default)]
pub struct SlidingWindowRateLimiter {
    windows: Mutex<HashMap<String, Vec<Instant>>>,
}

impl SlidingWindowRateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-action limits within a rolling window.
    fn limits(action: RateLimitAction) -> (usize, Duration) {
        match action {
            RateLimitAction::SendOtp => (3, Duration::from_secs(60 * 60)),
            RateLimitAction::VerifyOtp => (5, Duration::from_secs(10 * 60)),
            RateLimitAction::Register => (10, Duration::from_secs(60 * 60)),
            RateLimitAction::Login => (10, Duration::from_secs(15 * 60)),
        }
    }

    fn check(&self, key: String, action: RateLimitAction) -> RateLimitDecision {
        let (limit, window) = Self::limits(action);
        let now = Instant::now();

        // Fail closed if the lock is poisoned.
        let Ok(mut windows) = self.windows.lock() else {
            return RateLimitDecision::Limited;
        };
        let entries = windows.entry(key).or_default();
        entries.retain(|seen| now.duration_since(*seen) < window);
        if entries.len() >= limit {
            return RateLimitDecision::Limited;
        }
        entries.push(now);
        RateLimitDecision::Allowed
    }
}

impl RateLimiter for SlidingWindowRateLimiter {
    fn check_ip(&self, ip: Option<&str>, action: RateLimitAction) -> RateLimitDecision {
        match ip {
            Some(ip) => self.check(format!("ip:{action:?}:{ip}"), action),
            None => RateLimitDecision::Allowed,
        }
    }

    fn check_identity(&self, identity: &str, action: RateLimitAction) -> RateLimitDecision {
        self.check(format!("id:{action:?}:{identity}"), action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_rate_limiter_allows() {
        let limiter = NoopRateLimiter;
        assert_eq!(
            limiter.check_ip(None, RateLimitAction::SendOtp),
            RateLimitDecision::Allowed
        );
        assert_eq!(
            limiter.check_identity("+911234567890", RateLimitAction::Login),
            RateLimitDecision::Allowed
        );
    }

    #[test]
    fn sliding_window_enforces_limit() {
        let limiter = SlidingWindowRateLimiter::new();
        for _ in 0..3 {
            assert_eq!(
                limiter.check_ip(Some("1.2.3.4"), RateLimitAction::SendOtp),
                RateLimitDecision::Allowed
            );
        }
        assert_eq!(
            limiter.check_ip(Some("1.2.3.4"), RateLimitAction::SendOtp),
            RateLimitDecision::Limited
        );
    }

    #[test]
    fn keys_are_independent() {
        let limiter = SlidingWindowRateLimiter::new();
        for _ in 0..3 {
            limiter.check_ip(Some("1.2.3.4"), RateLimitAction::SendOtp);
        }
        // Different IP and different action both start fresh.
        assert_eq!(
            limiter.check_ip(Some("5.6.7.8"), RateLimitAction::SendOtp),
            RateLimitDecision::Allowed
        );
        assert_eq!(
            limiter.check_ip(Some("1.2.3.4"), RateLimitAction::VerifyOtp),
            RateLimitDecision::Allowed
        );
    }

    #[test]
    fn unknown_ip_is_not_limited() {
        let limiter = SlidingWindowRateLimiter::new();
        for _ in 0..10 {
            assert_eq!(
                limiter.check_ip(None, RateLimitAction::SendOtp),
                RateLimitDecision::Allowed
            );
        }
    }
}
