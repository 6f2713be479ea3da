//! Per-service recovery tracking.
//!
//! # State Transitions
//! ```text
//! Healthy/Unknown → Degraded/Unhealthy: failure timer starts
//! failing → failing:                    consecutive_failures += 1
//! failing → Healthy:                    downtime recorded, recovery_count += 1
//! Unknown → Healthy:                    not a recovery
//! ```
//!
//! Updated once per health cycle. Callers decide what to log; repeated
//! failures are surfaced only every [`FAILURE_LOG_EVERY`] cycles.

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

use super::ServiceHealth;

/// Log a still-failing service once per this many consecutive failures.
pub const FAILURE_LOG_EVERY: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing worth reporting.
    Steady,
    /// The service just started failing.
    Failed,
    StillFailing { consecutive: u32 },
    Recovered { downtime: Duration },
}

impl Transition {
    /// Whether this transition deserves a log line.
    pub fn should_log(&self) -> bool {
        match self {
            Transition::Steady => false,
            Transition::StillFailing { consecutive } => consecutive % FAILURE_LOG_EVERY == 0,
            Transition::Failed | Transition::Recovered { .. } => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceRecoveryTracker {
    pub previous_health: ServiceHealth,
    pub state_change_time: Instant,
    pub failure_start_time: Option<Instant>,
    pub consecutive_failures: u32,
    pub recovery_count: u32,
}

impl ServiceRecoveryTracker {
    pub fn new(now: Instant) -> Self {
        Self {
            previous_health: ServiceHealth::Unknown,
            state_change_time: now,
            failure_start_time: None,
            consecutive_failures: 0,
            recovery_count: 0,
        }
    }

    /// Fold one cycle's observation into the tracker.
    pub fn observe(&mut self, current: ServiceHealth, now: Instant) -> Transition {
        let previous = self.previous_health;
        if current != previous {
            self.state_change_time = now;
        }
        self.previous_health = current;

        if current.is_failing() {
            self.consecutive_failures += 1;
            return match self.failure_start_time {
                None => {
                    self.failure_start_time = Some(now);
                    Transition::Failed
                }
                Some(_) => Transition::StillFailing {
                    consecutive: self.consecutive_failures,
                },
            };
        }

        if current.is_healthy() {
            self.consecutive_failures = 0;
            if let Some(started) = self.failure_start_time.take() {
                self.recovery_count += 1;
                return Transition::Recovered {
                    downtime: now.saturating_duration_since(started),
                };
            }
        }
        Transition::Steady
    }

    /// How long the service has been failing, if it is.
    pub fn downtime(&self, now: Instant) -> Option<Duration> {
        self.failure_start_time
            .map(|started| now.saturating_duration_since(started))
    }

    pub fn summary(&self, now: Instant) -> RecoverySummary {
        RecoverySummary {
            health: self.previous_health,
            seconds_in_state: now.saturating_duration_since(self.state_change_time).as_secs(),
            consecutive_failures: self.consecutive_failures,
            recovery_count: self.recovery_count,
            downtime_secs: self.downtime(now).map(|d| d.as_secs()),
        }
    }
}

/// Serializable view for dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct RecoverySummary {
    pub health: ServiceHealth,
    pub seconds_in_state: u64,
    pub consecutive_failures: u32,
    pub recovery_count: u32,
    pub downtime_secs: Option<u64>,
}
