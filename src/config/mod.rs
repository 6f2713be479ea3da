//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → OrchestratorConfig (validated, immutable)
//!     → shared via Arc with the orchestrator and every facade
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, ChatConfig, CircuitBreakerConfig, DocumentConfig, FacadeConfig, FeedsConfig,
    HealthCheckConfig, MonitorConfig, ObservabilityConfig, OrchestratorConfig, RetryConfig,
    ServiceDefinition, ServiceKind,
};
pub use validation::{validate_config, ValidationError};
