//! Service facades.
//!
//! # Data Flow
//! ```text
//! caller
//!     → ChatFacade / DocumentFacade / FeedsFacade (domain method)
//!     → core.rs: cache lookup → breaker admit → service call → retry/backoff
//!     → collaborator service (services/)
//! ```
//!
//! # Design Decisions
//! - One facade per registered service, living until orchestrator shutdown
//! - Facades keep the collaborator's API shape; resilience is added around it
//! - Each concrete facade supplies its own cheap probe; timeouts, breaker
//!   short-circuiting and metrics come from the shared core

pub mod chat;
pub mod core;
pub mod document;
pub mod feeds;
pub mod metrics;

use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

use crate::config::OrchestratorConfig;
use crate::error::BoxError;
use crate::health::ServiceHealth;

pub use self::chat::ChatFacade;
pub use self::core::FacadeCore;
pub use self::document::DocumentFacade;
pub use self::feeds::FeedsFacade;
pub use self::metrics::{CircuitSnapshot, FacadeMetrics, FacadeSnapshot};

/// Object-safe surface the orchestrator manages.
#[async_trait]
pub trait Facade: Send + Sync + 'static {
    fn core(&self) -> &FacadeCore;

    /// Cheap check that the wrapped service answers. Runs under the core's
    /// probe timeout; never call it directly for health decisions.
    async fn basic_health_check(&self) -> Result<bool, BoxError>;

    /// Forward shutdown to the wrapped service.
    async fn shutdown(&self) -> Result<(), BoxError>;

    /// Upcast for typed lookups through [`get_facade`](crate::orchestrator::ServiceOrchestrator::get_facade).
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    fn name(&self) -> &str {
        self.core().name()
    }

    async fn health_check(&self) -> ServiceHealth {
        self.core().health_check(self.basic_health_check()).await
    }

    fn get_metrics(&self) -> FacadeSnapshot {
        self.core().snapshot()
    }

    fn clear_cache(&self) {
        self.core().clear_cache()
    }
}

/// A facade type that can be built straight from its service.
pub trait BuildFacade: Facade + Sized {
    type Service: ?Sized + Send + Sync + 'static;

    fn build(
        name: &str,
        service: Arc<Self::Service>,
        config: &OrchestratorConfig,
    ) -> Result<Self, BoxError>;
}

type FactoryFn<S> =
    dyn Fn(&str, Arc<S>, &OrchestratorConfig) -> Result<Arc<dyn Facade>, BoxError> + Send + Sync;

/// How a registered service is turned into its facade.
pub enum FacadeConstructor<S: ?Sized> {
    /// A facade type's own constructor.
    Direct(fn(&str, Arc<S>, &OrchestratorConfig) -> Result<Arc<dyn Facade>, BoxError>),
    /// An arbitrary factory closure.
    Factory(Box<FactoryFn<S>>),
}

impl<S: ?Sized + Send + Sync + 'static> FacadeConstructor<S> {
    pub fn of<F>() -> Self
    where
        F: BuildFacade<Service = S>,
    {
        FacadeConstructor::Direct(build_direct::<F>)
    }

    pub fn factory<C>(factory: C) -> Self
    where
        C: Fn(&str, Arc<S>, &OrchestratorConfig) -> Result<Arc<dyn Facade>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        FacadeConstructor::Factory(Box::new(factory))
    }

    pub fn construct(
        &self,
        name: &str,
        service: Arc<S>,
        config: &OrchestratorConfig,
    ) -> Result<Arc<dyn Facade>, BoxError> {
        match self {
            FacadeConstructor::Direct(build) => build(name, service, config),
            FacadeConstructor::Factory(factory) => factory(name, service, config),
        }
    }
}

fn build_direct<F: BuildFacade>(
    name: &str,
    service: Arc<F::Service>,
    config: &OrchestratorConfig,
) -> Result<Arc<dyn Facade>, BoxError> {
    Ok(Arc::new(F::build(name, service, config)?))
}
