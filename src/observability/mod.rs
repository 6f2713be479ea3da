//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Facades and the orchestrator produce:
//!     → logging.rs (structured log events, health cycles in a span with a cycle id)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap (no-op until a recorder is installed)

pub mod logging;
pub mod metrics;
