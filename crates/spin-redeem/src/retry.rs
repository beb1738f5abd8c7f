//! Commit retry policy

use std::thread;
use std::time::Duration;

/// Bounded exponential backoff applied at the transaction-commit boundary.
///
/// Conflicts between concurrent redemptions are expected under load; they are
/// retried up to `max_attempts` before being surfaced as an internal fault.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first (must be at least 1)
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles per attempt
    pub base_delay: Duration,
    /// Ceiling on the per-attempt delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Immediate retries, for tests and simulations
    pub fn no_delay(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay to wait after a failed `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }

    pub(crate) fn backoff(&self, attempt: u32) {
        let delay = self.delay_for(attempt);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_up_to_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(10));
        assert_eq!(policy.delay_for(2), Duration::from_millis(20));
        assert_eq!(policy.delay_for(3), Duration::from_millis(40));
        assert_eq!(policy.delay_for(10), Duration::from_millis(250));
    }

    #[test]
    fn test_no_delay_policy() {
        let policy = RetryPolicy::no_delay(3);
        assert_eq!(policy.max_attempts, 3);
        assert!(policy.delay_for(1).is_zero());
        assert!(policy.delay_for(8).is_zero());
    }
}
