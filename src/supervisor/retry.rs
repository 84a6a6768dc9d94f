//! Reconnect policy

use std::time::Duration;

/// Default attempt ceiling
pub const DEFAULT_MAX_ATTEMPTS: u32 = 50;

/// Default backoff step
pub const DEFAULT_BASE_STEP: Duration = Duration::from_secs(5);

/// Default backoff ceiling
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Bounded linear backoff
///
/// The wait before retry `n` is `min(base_step * n, max_delay)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Failed attempts after which the supervisor gives up
    pub max_attempts: u32,
    /// Delay added per failed attempt
    pub base_step: Duration,
    /// Longest wait between attempts
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_step: DEFAULT_BASE_STEP,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Set the attempt ceiling (at least 1)
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the backoff step
    pub fn base_step(mut self, step: Duration) -> Self {
        self.base_step = step;
        self
    }

    /// Set the backoff ceiling
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Wait before the retry that follows failure number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_step.saturating_mul(attempt).min(self.max_delay)
    }

    /// Whether `failures` failed attempts exhaust the policy
    pub fn is_exhausted(&self, failures: u32) -> bool {
        failures >= self.max_attempts
    }
}
