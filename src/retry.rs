//! Reconnect policy for the live stream.
//!
//! DESIGN
//! ======
//! The connection state machine never retries on its own. When a policy is
//! enabled, the session consults a [`Backoff`] after the connection reaches
//! `Closed` and schedules the next handshake itself. The default policy is
//! disabled: the connection closes once and stays closed.

use std::time::Duration;

use rand::Rng;

pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Consecutive reconnect attempts allowed after a close. Zero disables
    /// reconnection.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    #[must_use]
    pub const fn disabled() -> Self {
        Self::with_attempts(0)
    }

    /// Bounded exponential backoff with the default delays.
    #[must_use]
    pub const fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Attempt counter for one [`ReconnectPolicy`].
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl Backoff {
    #[must_use]
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { policy, attempts: 0 }
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before the next attempt, or `None` once the policy is exhausted.
    ///
    /// The base delay doubles per attempt up to `max_delay`; up to 10% jitter
    /// is added without exceeding the cap.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.policy.max_attempts {
            return None;
        }
        let base = self.base_delay(self.attempts);
        self.attempts += 1;

        let jitter_cap = u64::try_from(base.as_millis() / 10).unwrap_or(0);
        let jitter = if jitter_cap == 0 { 0 } else { rand::rng().random_range(0..=jitter_cap) };
        Some((base + Duration::from_millis(jitter)).min(self.policy.max_delay))
    }

    /// Forget previous failures after a successful handshake.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt);
        self.policy
            .initial_delay
            .saturating_mul(factor)
            .min(self.policy.max_delay)
    }
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;
