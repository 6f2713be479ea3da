//! Serializable views of orchestrator state.

use serde::Serialize;

use crate::facade::FacadeSnapshot;
use crate::health::{RecoverySummary, ServiceHealth, ServiceStatus};
use crate::lifecycle::LifecyclePhase;
use crate::resilience::CircuitState;

/// Per-service section of [`ComprehensiveMetrics`].
#[derive(Debug, Clone, Serialize)]
pub struct ServiceReport {
    pub name: String,
    pub critical: bool,
    pub dependencies: Vec<String>,
    pub health: ServiceHealth,
    /// Whether a facade was built for this service.
    pub initialized: bool,
    pub recovery: Option<RecoverySummary>,
    pub facade: Option<FacadeSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComprehensiveMetrics {
    pub status: ServiceStatus,
    pub phase: LifecyclePhase,
    pub initialization_order: Vec<String>,
    pub health_cycles: u64,
    pub skipped_health_cycles: u64,
    pub last_health_check_secs_ago: Option<u64>,
    pub services: Vec<ServiceReport>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthCounts {
    pub healthy: usize,
    pub degraded: usize,
    pub unhealthy: usize,
    pub unknown: usize,
}

impl HealthCounts {
    pub fn tally<I: IntoIterator<Item = ServiceHealth>>(healths: I) -> Self {
        let mut counts = Self::default();
        for health in healths {
            match health {
                ServiceHealth::Healthy => counts.healthy += 1,
                ServiceHealth::Degraded => counts.degraded += 1,
                ServiceHealth::Unhealthy => counts.unhealthy += 1,
                ServiceHealth::Unknown => counts.unknown += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.healthy + self.degraded + self.unhealthy + self.unknown
    }
}

/// One row of the health dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardEntry {
    pub name: String,
    pub health: ServiceHealth,
    pub critical: bool,
    pub circuit: Option<CircuitState>,
    pub consecutive_failures: u32,
    pub recovery_count: u32,
    pub downtime_secs: Option<u64>,
    pub avg_response_time_ms: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthDashboard {
    pub status: ServiceStatus,
    pub phase: LifecyclePhase,
    pub counts: HealthCounts,
    /// Critical services that are not healthy right now.
    pub critical_issues: Vec<String>,
    pub services: Vec<DashboardEntry>,
    /// Unix seconds.
    pub generated_at: u64,
}

/// Outcome of [`ServiceOrchestrator::shutdown`](super::ServiceOrchestrator::shutdown).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    pub stopped: Vec<String>,
    pub failed: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_counts_each_state() {
        let counts = HealthCounts::tally([
            ServiceHealth::Healthy,
            ServiceHealth::Healthy,
            ServiceHealth::Degraded,
            ServiceHealth::Unknown,
        ]);
        assert_eq!(counts.healthy, 2);
        assert_eq!(counts.degraded, 1);
        assert_eq!(counts.unhealthy, 0);
        assert_eq!(counts.total(), 4);
    }
}
