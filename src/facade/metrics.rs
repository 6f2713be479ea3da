//! Per-facade counters and the snapshot handed to dashboards.

use serde::Serialize;
use std::time::Duration;

use crate::health::ServiceHealth;
use crate::resilience::CircuitState;

/// Running counters for one facade. Mutated under the facade's lock.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FacadeMetrics {
    /// Attempts that reached the service.
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    /// Calls refused by an open breaker.
    pub rejected_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Mean latency of successful attempts.
    pub avg_response_time_ms: f64,
    /// Unix seconds of the last health check.
    pub last_health_check: Option<u64>,
    pub last_health: ServiceHealth,
}

impl FacadeMetrics {
    pub fn record_success(&mut self, elapsed: Duration) {
        self.total_requests += 1;
        self.successful_requests += 1;
        let sample = elapsed.as_secs_f64() * 1000.0;
        // Incremental mean: avg += (x - avg) / n
        self.avg_response_time_ms +=
            (sample - self.avg_response_time_ms) / self.successful_requests as f64;
    }

    pub fn record_failure(&mut self) {
        self.total_requests += 1;
        self.failed_requests += 1;
    }

    pub fn cache_hit_ratio(&self) -> Option<f64> {
        let lookups = self.cache_hits + self.cache_misses;
        (lookups > 0).then(|| self.cache_hits as f64 / lookups as f64)
    }
}

/// Breaker fields exposed in snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub failure_threshold: u32,
    pub recovery_timeout_secs: u64,
}

/// Everything `get_metrics()` reports for one facade.
#[derive(Debug, Clone, Serialize)]
pub struct FacadeSnapshot {
    pub service: String,
    #[serde(flatten)]
    pub metrics: FacadeMetrics,
    pub cache_hit_ratio: Option<f64>,
    pub cache_entries: usize,
    pub circuit: CircuitSnapshot,
}
