//! Retry policy.
//!
//! # Responsibilities
//! - Describe how many times an operation is retried and how long to wait
//! - Compute per-attempt delays with exponential backoff (+ optional jitter)
//!
//! # Design Decisions
//! - Policies are per operation: interactive calls get short budgets,
//!   bulk/background calls longer ones
//! - The retry loop itself lives in the facade, next to the breaker and
//!   metrics it must update

use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

/// How a single facade operation is retried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; the call runs at most `max_retries + 1` times.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_ratio: f64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
            jitter_ratio: 0.0,
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Apply the shared limits from configuration.
    pub fn with_limits(mut self, config: &RetryConfig) -> Self {
        self.max_delay = Duration::from_millis(config.max_delay_ms);
        self.jitter_ratio = config.jitter_ratio;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay after failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_delay, self.max_delay, self.jitter_ratio)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double_per_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(250));
        let delays: Vec<_> = (0..policy.max_retries).map(|a| policy.delay_for(a)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(250),
                Duration::from_millis(500),
                Duration::from_millis(1000)
            ]
        );
        assert_eq!(policy.max_attempts(), 4);
    }

    #[test]
    fn limits_cap_delay() {
        let config = RetryConfig {
            max_delay_ms: 700,
            jitter_ratio: 0.0,
        };
        let policy = RetryPolicy::new(5, Duration::from_millis(250)).with_limits(&config);
        assert_eq!(policy.delay_for(4), Duration::from_millis(700));
    }
}
