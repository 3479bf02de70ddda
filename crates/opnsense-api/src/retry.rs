//! Retry policy for API requests.
//!
//! Connection failures, timeouts, throttling and server errors are
//! retried with capped exponential backoff. Everything else fails fast.

use std::time::Duration;

// ── Defaults ─────────────────────────────────────────────────────────

pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);
pub const DEFAULT_MIN_BACKOFF: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_RETRIES: u32 = 4;

// ── RetryPolicy ──────────────────────────────────────────────────────

/// Exponential backoff configuration for failed requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry. Default: 1s.
    pub min_backoff: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_backoff: Duration,

    /// Retries after the initial attempt. Default: 4.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_backoff: DEFAULT_MIN_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    /// Build a policy from user-facing second/count values.
    ///
    /// Zero (or negative) keeps the default for that knob.
    pub fn from_settings(max_backoff_secs: i64, min_backoff_secs: i64, max_retries: i64) -> Self {
        let mut policy = Self::default();
        if let Some(secs) = u64::try_from(max_backoff_secs).ok().filter(|s| *s != 0) {
            policy.max_backoff = Duration::from_secs(secs);
        }
        if let Some(secs) = u64::try_from(min_backoff_secs).ok().filter(|s| *s != 0) {
            policy.min_backoff = Duration::from_secs(secs);
        }
        if let Some(retries) = u32::try_from(max_retries).ok().filter(|r| *r != 0) {
            policy.max_retries = retries;
        }
        policy
    }

    /// Delay before retry number `attempt` (zero-based).
    ///
    /// `delay = min(min_backoff * 2^attempt, max_backoff)`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt);
        self.min_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |d| d.min(self.max_backoff))
    }
}

// ── Tests ────────────────────────────────────────────────────────────
