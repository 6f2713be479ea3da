//! Background loops driving the orchestrator.
//!
//! # Responsibilities
//! - Run a health cycle at the monitor cadence
//! - Back off exponentially when a cycle fails, reset on the next success
//! - Publish metric snapshots on a slower cadence
//!
//! Both loops exit as soon as the shutdown signal arrives, including in the
//! middle of a cycle.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinError;
use tokio::time;

use crate::orchestrator::ServiceOrchestrator;
use crate::resilience::backoff::calculate_backoff;

pub struct HealthMonitor {
    orchestrator: ServiceOrchestrator,
    interval: Duration,
    max_backoff: Duration,
}

impl HealthMonitor {
    pub fn new(orchestrator: ServiceOrchestrator, interval: Duration, max_backoff: Duration) -> Self {
        Self {
            orchestrator,
            interval,
            max_backoff: max_backoff.max(interval),
        }
    }

    /// Delay before the next cycle given the current failure streak.
    pub fn next_delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            self.interval
        } else {
            calculate_backoff(failures - 1, self.interval, self.max_backoff, 0.0)
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Health monitor starting");
        let mut failures: u32 = 0;

        loop {
            let orchestrator = self.orchestrator.clone();
            let mut cycle = tokio::spawn(async move {
                orchestrator.perform_health_checks().await;
            });

            tokio::select! {
                joined = &mut cycle => failures = record_cycle(failures, joined),
                _ = shutdown.recv() => {
                    cycle.abort();
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }

            let delay = self.next_delay(failures);
            if failures > 0 {
                tracing::warn!(delay = ?delay, "Health monitor backing off");
            }
            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

/// Failure streak after a cycle finished; a panicked cycle extends it, a
/// completed one clears it.
fn record_cycle(failures: u32, joined: Result<(), JoinError>) -> u32 {
    match joined {
        Ok(()) => {
            if failures > 0 {
                tracing::info!(failures, "Health monitor recovered");
            }
            0
        }
        Err(e) => {
            let failures = failures.saturating_add(1);
            tracing::error!(error = %e, failures, "Health cycle failed");
            failures
        }
    }
}

pub struct MetricsCollector {
    orchestrator: ServiceOrchestrator,
    interval: Duration,
}

impl MetricsCollector {
    pub fn new(orchestrator: ServiceOrchestrator, interval: Duration) -> Self {
        Self {
            orchestrator,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.orchestrator.publish_metrics();
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Metrics collector received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;

    #[test]
    fn delay_doubles_per_failure_up_to_cap() {
        let monitor = HealthMonitor::new(
            ServiceOrchestrator::new(OrchestratorConfig::default()),
            Duration::from_secs(60),
            Duration::from_secs(600),
        );
        assert_eq!(monitor.next_delay(0), Duration::from_secs(60));
        assert_eq!(monitor.next_delay(1), Duration::from_secs(60));
        assert_eq!(monitor.next_delay(2), Duration::from_secs(120));
        assert_eq!(monitor.next_delay(3), Duration::from_secs(240));
        assert_eq!(monitor.next_delay(5), Duration::from_secs(600));
    }

    async fn panicked_cycle() -> Result<(), JoinError> {
        tokio::spawn(async { panic!("cycle blew up") }).await
    }

    #[tokio::test]
    async fn failed_cycles_grow_streak_until_success() {
        let mut failures = 0;
        failures = record_cycle(failures, panicked_cycle().await);
        assert_eq!(failures, 1);
        failures = record_cycle(failures, panicked_cycle().await);
        assert_eq!(failures, 2);

        failures = record_cycle(failures, Ok(()));
        assert_eq!(failures, 0);
        assert_eq!(record_cycle(failures, Ok(())), 0);
    }

    #[tokio::test]
    async fn streak_saturates_instead_of_wrapping() {
        assert_eq!(record_cycle(u32::MAX, panicked_cycle().await), u32::MAX);
    }
}
