//! Service orchestration.
//!
//! # Data Flow
//! ```text
//! ServiceFactory::create (factory.rs)
//!     → register (core.rs): ServiceConfig stored (registry.rs), facade built
//!     → initialize_services: order from graph.rs, fast init, loops started
//!     → HealthMonitor → perform_health_checks → health map, status
//!     → get_comprehensive_metrics / dashboard (report.rs)
//!     → shutdown: loops stopped, facades shut down in reverse order
//! ```
//!
//! # Design Decisions
//! - The orchestrator is an explicit handle passed around, not a global
//! - Facades are built at registration so construction errors surface early
//! - Lifecycle phases are checked on every transition

pub mod core;
pub mod factory;
pub mod graph;
pub mod registry;
pub mod report;

pub use self::core::ServiceOrchestrator;
pub use factory::{ServiceFactory, ServiceInstances};
pub use graph::DependencyGraph;
pub use registry::ServiceConfig;
pub use report::{
    ComprehensiveMetrics, DashboardEntry, HealthCounts, HealthDashboard, ServiceReport,
    ShutdownReport,
};
