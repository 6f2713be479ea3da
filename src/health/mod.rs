//! Health tracking subsystem.
//!
//! # Data Flow
//! ```text
//! monitor.rs (HealthMonitor):
//!     Periodic timer, with backoff after failed cycles
//!     → ServiceOrchestrator::perform_health_checks
//!     → ServiceHealth per service (state.rs)
//!
//! recovery.rs:
//!     One observation per cycle
//!     → failure streaks, downtime, recovery count
//!
//! state.rs:
//!     Per-service health + criticality → overall ServiceStatus
//! ```
//!
//! # Design Decisions
//! - Health is per-service; the overall status is always derived, never set
//! - Unknown counts as not healthy, so a critical service that was never
//!   probed successfully keeps the status away from READY
//! - Metrics publishing runs on its own, slower loop

pub mod monitor;
pub mod recovery;
pub mod state;

pub use monitor::{HealthMonitor, MetricsCollector};
pub use recovery::{RecoverySummary, ServiceRecoveryTracker, Transition};
pub use state::{derive_status, ServiceHealth, ServiceStatus};
