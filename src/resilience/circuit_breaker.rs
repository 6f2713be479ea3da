//! Circuit breaker for service protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: service assumed down, calls fail fast
//! - Half-Open: recovery timeout elapsed, testing if the service recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Half-Open: now - last_failure_time >= recovery_timeout
//! Half-Open → Closed: trial call succeeds (failure_count reset to 0)
//! Half-Open → Open: trial call fails
//! ```
//!
//! # Design Decisions
//! - Per-facade circuit breaker (not global)
//! - Fail fast in Open state (no waiting for timeout)
//! - Single trial call in Half-Open unless configured otherwise; the
//!   time-based mode lets every caller through once the timeout elapses

use std::time::Duration;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;

/// Outcome of asking the breaker whether a call may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Breaker closed.
    Allowed,
    /// Breaker was open but has cooled down; this call tests the service.
    Trial,
    /// Breaker open; the caller should wait `retry_in`.
    Rejected { retry_in: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Admission::Rejected { .. })
    }
}

/// Observable breaker state, for metrics and dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Per-facade breaker record. Callers hold the facade's lock while touching it.
#[derive(Debug, Clone)]
pub struct CircuitBreakerState {
    pub failure_count: u32,
    pub last_failure_time: Option<Instant>,
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
    pub is_open: bool,
    single_trial: bool,
    trial_started: Option<Instant>,
}

impl CircuitBreakerState {
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_count: 0,
            last_failure_time: None,
            failure_threshold: failure_threshold.max(1),
            recovery_timeout,
            is_open: false,
            single_trial: true,
            trial_started: None,
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(
            config.failure_threshold,
            Duration::from_secs(config.recovery_timeout_secs),
        )
        .with_single_trial(config.half_open_trial)
    }

    /// Choose between half-open trial admission and purely time-based recovery.
    pub fn with_single_trial(mut self, single_trial: bool) -> Self {
        self.single_trial = single_trial;
        self
    }

    fn cooled_down(&self, now: Instant) -> bool {
        match self.last_failure_time {
            Some(at) => now.saturating_duration_since(at) >= self.recovery_timeout,
            None => true,
        }
    }

    fn retry_in(&self, now: Instant) -> Duration {
        match self.last_failure_time {
            Some(at) => self
                .recovery_timeout
                .saturating_sub(now.saturating_duration_since(at)),
            None => Duration::ZERO,
        }
    }

    /// Decide whether a call may proceed right now.
    pub fn try_acquire(&mut self, now: Instant) -> Admission {
        if !self.is_open {
            return Admission::Allowed;
        }
        if !self.cooled_down(now) {
            return Admission::Rejected {
                retry_in: self.retry_in(now),
            };
        }
        if !self.single_trial {
            // Time-based recovery: the breaker simply closes.
            self.is_open = false;
            return Admission::Allowed;
        }

        // A trial whose caller vanished without reporting back is treated as
        // lost once another recovery window has passed.
        let trial_in_flight = self
            .trial_started
            .is_some_and(|at| now.saturating_duration_since(at) < self.recovery_timeout);
        if trial_in_flight {
            return Admission::Rejected {
                retry_in: Duration::ZERO,
            };
        }
        self.trial_started = Some(now);
        Admission::Trial
    }

    /// Whether calls would currently be refused, without claiming a trial slot.
    pub fn is_rejecting(&self, now: Instant) -> bool {
        self.is_open && !self.cooled_down(now)
    }

    pub fn record_success(&mut self) {
        self.failure_count = 0;
        self.is_open = false;
        self.trial_started = None;
    }

    /// Record a failed call. Returns true if this failure opened the breaker.
    pub fn record_failure(&mut self, now: Instant) -> bool {
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure_time = Some(now);
        self.trial_started = None;

        let was_open = self.is_open;
        if self.failure_count >= self.failure_threshold {
            self.is_open = true;
        }
        self.is_open && !was_open
    }

    pub fn state(&self, now: Instant) -> CircuitState {
        if !self.is_open {
            CircuitState::Closed
        } else if self.cooled_down(now) {
            CircuitState::HalfOpen
        } else {
            CircuitState::Open
        }
    }
}

impl Default for CircuitBreakerState {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_exactly_at_threshold() {
        let now = Instant::now();
        let mut cb = CircuitBreakerState::new(3, Duration::from_secs(60));

        assert!(!cb.record_failure(now));
        assert!(!cb.record_failure(now));
        assert_eq!(cb.state(now), CircuitState::Closed);
        assert!(cb.record_failure(now));
        assert_eq!(cb.state(now), CircuitState::Open);
        assert!(!cb.try_acquire(now).is_allowed());
    }

    #[test]
    fn success_resets_failure_count() {
        let now = Instant::now();
        let mut cb = CircuitBreakerState::new(3, Duration::from_secs(60));

        cb.record_failure(now);
        cb.record_failure(now);
        cb.record_success();
        assert_eq!(cb.failure_count, 0);

        cb.record_failure(now);
        assert_eq!(cb.state(now), CircuitState::Closed);
    }

    #[test]
    fn half_open_admits_one_trial() {
        let start = Instant::now();
        let mut cb = CircuitBreakerState::new(2, Duration::from_secs(10));
        cb.record_failure(start);
        cb.record_failure(start);

        let later = start + Duration::from_secs(10);
        assert_eq!(cb.state(later), CircuitState::HalfOpen);
        assert_eq!(cb.try_acquire(later), Admission::Trial);
        assert!(!cb.try_acquire(later).is_allowed());

        cb.record_success();
        assert_eq!(cb.try_acquire(later), Admission::Allowed);
        assert_eq!(cb.failure_count, 0);
    }

    #[test]
    fn failed_trial_reopens() {
        let start = Instant::now();
        let mut cb = CircuitBreakerState::new(2, Duration::from_secs(10));
        cb.record_failure(start);
        cb.record_failure(start);

        let later = start + Duration::from_secs(11);
        assert_eq!(cb.try_acquire(later), Admission::Trial);
        cb.record_failure(later);

        assert_eq!(
            cb.try_acquire(later + Duration::from_secs(1)),
            Admission::Rejected {
                retry_in: Duration::from_secs(9)
            }
        );
    }

    #[test]
    fn abandoned_trial_expires() {
        let start = Instant::now();
        let mut cb = CircuitBreakerState::new(1, Duration::from_secs(5));
        cb.record_failure(start);

        let t1 = start + Duration::from_secs(5);
        assert_eq!(cb.try_acquire(t1), Admission::Trial);
        assert!(!cb.try_acquire(t1 + Duration::from_secs(4)).is_allowed());
        assert_eq!(cb.try_acquire(t1 + Duration::from_secs(5)), Admission::Trial);
    }

    #[test]
    fn time_based_mode_lets_everyone_through() {
        let start = Instant::now();
        let mut cb = CircuitBreakerState::new(1, Duration::from_secs(5)).with_single_trial(false);
        cb.record_failure(start);

        let later = start + Duration::from_secs(5);
        assert_eq!(cb.try_acquire(later), Admission::Allowed);
        assert_eq!(cb.try_acquire(later), Admission::Allowed);
        assert!(!cb.is_open);
        // failure_count survives until a success, so one more failure reopens.
        cb.record_failure(later);
        assert!(cb.is_open);
    }
}
