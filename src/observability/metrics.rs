//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define facade and orchestrator metrics
//! - Expose a Prometheus-compatible scrape endpoint when enabled
//! - Publish periodic per-facade snapshots from the collector loop
//!
//! # Metrics
//! - `facade_calls_total` (counter): attempts by service, operation, outcome
//! - `facade_call_duration_seconds` (histogram): attempt latency
//! - `facade_cache_events_total` (counter): hits and misses by service
//! - `facade_circuit_open_total` (counter): calls rejected by an open breaker
//! - `service_health` (gauge): 1=healthy, 0.5=degraded, 0=unhealthy, -1=unknown
//! - `orchestrator_status` (gauge): 1=ready, 0.5=degraded, 0=failed, -1=initializing
//! - `health_cycle_duration_seconds` (histogram): one full probe round
//! - `health_cycles_skipped_total` (counter): calls answered from the last round
//! - `service_recoveries_total` (counter): failing → healthy transitions
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so tests need no setup
//! - Labels are service and operation names, never request data

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

use crate::facade::FacadeSnapshot;
use crate::health::{ServiceHealth, ServiceStatus};

/// Install the Prometheus recorder and its HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_facade_call(service: &str, operation: &'static str, outcome: &'static str, elapsed: Duration) {
    counter!(
        "facade_calls_total",
        "service" => service.to_string(),
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "facade_call_duration_seconds",
        "service" => service.to_string(),
        "operation" => operation
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_cache_event(service: &str, event: &'static str) {
    counter!("facade_cache_events_total", "service" => service.to_string(), "event" => event)
        .increment(1);
}

pub fn record_circuit_open(service: &str) {
    counter!("facade_circuit_open_total", "service" => service.to_string()).increment(1);
}

pub fn record_service_health(service: &str, health: ServiceHealth) {
    gauge!("service_health", "service" => service.to_string()).set(health.as_gauge());
}

pub fn record_orchestrator_status(status: ServiceStatus) {
    gauge!("orchestrator_status").set(status.as_gauge());
}

pub fn record_health_cycle(elapsed: Duration) {
    histogram!("health_cycle_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_health_cycle_skipped() {
    counter!("health_cycles_skipped_total").increment(1);
}

pub fn record_recovery(service: &str) {
    counter!("service_recoveries_total", "service" => service.to_string()).increment(1);
}

/// Publish one facade's counters as gauges.
pub fn record_facade_snapshot(snapshot: &FacadeSnapshot) {
    let service = snapshot.service.clone();
    let m = &snapshot.metrics;
    gauge!("facade_requests", "service" => service.clone()).set(m.total_requests as f64);
    gauge!("facade_failed_requests", "service" => service.clone()).set(m.failed_requests as f64);
    gauge!("facade_rejected_requests", "service" => service.clone()).set(m.rejected_requests as f64);
    gauge!("facade_avg_response_time_ms", "service" => service.clone()).set(m.avg_response_time_ms);
    gauge!("facade_cache_entries", "service" => service.clone()).set(snapshot.cache_entries as f64);
    gauge!("facade_circuit_failures", "service" => service)
        .set(snapshot.circuit.failure_count as f64);
}
