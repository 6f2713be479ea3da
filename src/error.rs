//! Error types shared across the facade and orchestrator layers.
//!
//! # Propagation
//! ```text
//! wrapped service call fails
//!     → retried locally (resilience/retries.rs)
//!     → retries exhausted: FacadeError::Service (original error, unchanged)
//!     → breaker open:      FacadeError::CircuitOpen (service never contacted)
//!
//! health probe fails / times out
//!     → absorbed into a ServiceHealth value, never returned
//!
//! critical facade cannot be built
//!     → OrchestratorError::Initialization, startup aborts
//! ```

use std::time::Duration;

/// Error type used by collaborator services.
///
/// Facades never inspect it; it is carried back to the caller as-is.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by facade operations.
#[derive(Debug, thiserror::Error)]
pub enum FacadeError {
    /// The breaker for this facade is open; the service was not called.
    #[error("circuit open for service '{service}' (retry in {retry_in:?})")]
    CircuitOpen { service: String, retry_in: Duration },

    /// The wrapped call kept failing; this is the last error it returned.
    #[error(transparent)]
    Service(BoxError),
}

impl FacadeError {
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, FacadeError::CircuitOpen { .. })
    }

    /// Take back the collaborator's original error, if this is one.
    pub fn into_service_error(self) -> Option<BoxError> {
        match self {
            FacadeError::Service(err) => Some(err),
            FacadeError::CircuitOpen { .. } => None,
        }
    }
}

/// Errors raised by the orchestrator's registry and startup path.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// A critical facade could not be constructed.
    #[error("failed to initialize service '{service}': {reason}")]
    Initialization { service: String, reason: String },

    #[error("service '{0}' is already registered")]
    DuplicateService(String),

    #[error("service '{service}' depends on unregistered service '{dependency}'")]
    UnknownDependency { service: String, dependency: String },

    #[error("dependency cycle detected: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// Lifecycle misuse, e.g. initializing twice or after shutdown.
    #[error("invalid lifecycle transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

pub type Result<T, E = OrchestratorError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("upstream said no")]
    struct Upstream;

    #[test]
    fn service_error_is_passed_through_unchanged() {
        let err = FacadeError::Service(Box::new(Upstream));
        assert_eq!(err.to_string(), "upstream said no");
        assert!(!err.is_circuit_open());

        let original = err.into_service_error().unwrap();
        assert!(original.downcast_ref::<Upstream>().is_some());
    }

    #[test]
    fn cycle_message_lists_path() {
        let err = OrchestratorError::DependencyCycle(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "dependency cycle detected: a -> b -> a");
    }
}
