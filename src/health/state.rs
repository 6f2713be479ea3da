//! Service health values and the derived overall status.
//!
//! # Overall status
//! ```text
//! no completed health cycle yet                → Initializing
//! a critical service failed to initialize      → Failed
//! any critical service not Healthy             → Failed
//! critical Healthy, some non-critical not      → Degraded
//! everything Healthy                           → Ready
//! ```
//!
//! The overall status is recomputed from the per-service map after every
//! cycle and never stored on its own.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Health of a single service, as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceHealth {
    Healthy,
    Degraded,
    Unhealthy,
    /// No probe has run yet.
    #[default]
    Unknown,
}

impl ServiceHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ServiceHealth::Healthy)
    }

    /// Degraded or Unhealthy. Unknown is not a failure, just absence of data.
    pub fn is_failing(&self) -> bool {
        matches!(self, ServiceHealth::Degraded | ServiceHealth::Unhealthy)
    }

    /// Gauge value used for metrics export.
    pub fn as_gauge(&self) -> f64 {
        match self {
            ServiceHealth::Healthy => 1.0,
            ServiceHealth::Degraded => 0.5,
            ServiceHealth::Unhealthy => 0.0,
            ServiceHealth::Unknown => -1.0,
        }
    }
}

impl fmt::Display for ServiceHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceHealth::Healthy => write!(f, "HEALTHY"),
            ServiceHealth::Degraded => write!(f, "DEGRADED"),
            ServiceHealth::Unhealthy => write!(f, "UNHEALTHY"),
            ServiceHealth::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Orchestrator-wide status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceStatus {
    Initializing,
    Ready,
    Degraded,
    Failed,
}

impl ServiceStatus {
    pub fn as_gauge(&self) -> f64 {
        match self {
            ServiceStatus::Ready => 1.0,
            ServiceStatus::Degraded => 0.5,
            ServiceStatus::Failed => 0.0,
            ServiceStatus::Initializing => -1.0,
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Initializing => write!(f, "INITIALIZING"),
            ServiceStatus::Ready => write!(f, "READY"),
            ServiceStatus::Degraded => write!(f, "DEGRADED"),
            ServiceStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Derive the overall status from `(health, critical)` pairs of one cycle.
pub fn derive_status<I>(services: I) -> ServiceStatus
where
    I: IntoIterator<Item = (ServiceHealth, bool)>,
{
    let mut non_critical_impaired = false;
    for (health, critical) in services {
        if health.is_healthy() {
            continue;
        }
        if critical {
            return ServiceStatus::Failed;
        }
        non_critical_impaired = true;
    }

    if non_critical_impaired {
        ServiceStatus::Degraded
    } else {
        ServiceStatus::Ready
    }
}
