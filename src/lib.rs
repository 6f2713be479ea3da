//! Service resilience and orchestration library.
//!
//! Facades wrap chat, document and feed services with circuit breaking,
//! retries, TTL caching and metrics; the orchestrator initializes them in
//! dependency order and keeps their health up to date.

pub mod admin;
pub mod config;
pub mod error;
pub mod facade;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod orchestrator;
pub mod resilience;
pub mod services;

mod sync;

pub use config::OrchestratorConfig;
pub use error::{BoxError, FacadeError, OrchestratorError};
pub use facade::{ChatFacade, DocumentFacade, Facade, FacadeConstructor, FeedsFacade};
pub use health::{ServiceHealth, ServiceStatus};
pub use lifecycle::{LifecyclePhase, Shutdown};
pub use orchestrator::{ServiceConfig, ServiceFactory, ServiceInstances, ServiceOrchestrator};
