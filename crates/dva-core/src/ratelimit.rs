//! Server-communicated request quota tracking.

use std::time::Duration;

use chrono::Utc;

/// Process-wide rate-limit bookkeeping, updated from the
/// `x-ratelimit-remaining` response header.
///
/// Lives for the process lifetime; the agent shares one instance between
/// the scheduler and the submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitState {
    /// Total quota within the reset window.
    pub limit: i64,

    /// Requests left, per the most recent response header.
    pub remaining: i64,

    /// Epoch seconds at which the quota resets.
    pub reset_at: i64,
}

impl RateLimitState {
    /// Construct with explicit values.
    pub fn new(limit: i64, remaining: i64, reset_at: i64) -> Self {
        Self {
            limit,
            remaining,
            reset_at,
        }
    }

    /// Record the remaining quota reported by the server.
    pub fn observe_remaining(&mut self, remaining: i64) {
        self.remaining = remaining;
    }

    /// How long to hold off before the next request, if the quota is
    /// spent. `None` means the next request may proceed immediately,
    /// including when the reset time has already passed.
    pub fn wait_until_reset(&self, now: i64) -> Option<Duration> {
        if self.remaining > 0 {
            return None;
        }
        let wait = self.reset_at - now;
        (wait > 0).then(|| Duration::from_secs(wait as u64))
    }
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self {
            limit: 10_000,
            remaining: 9_997,
            reset_at: Utc::now().timestamp() + 3_600,
        }
    }
}
