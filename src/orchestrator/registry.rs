//! Service registration records.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::OrchestratorConfig;
use crate::error::BoxError;
use crate::facade::{Facade, FacadeConstructor};

type BuildFn = dyn Fn(&str, &OrchestratorConfig) -> Result<Arc<dyn Facade>, BoxError> + Send + Sync;

/// Everything the orchestrator knows about one registered service.
///
/// The raw service instance is captured together with its constructor, so
/// the record stays object-safe whatever the service type.
pub struct ServiceConfig {
    pub name: String,
    pub dependencies: Vec<String>,
    pub critical: bool,
    pub health_check_interval: Duration,
    /// Construction attempts before giving up.
    pub max_init_retries: u32,
    build: Box<BuildFn>,
}

impl ServiceConfig {
    pub fn new<S>(name: impl Into<String>, service: Arc<S>, constructor: FacadeConstructor<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            critical: false,
            health_check_interval: Duration::from_secs(60),
            max_init_retries: 3,
            build: Box::new(move |name: &str, config: &OrchestratorConfig| {
                constructor.construct(name, Arc::clone(&service), config)
            }),
        }
    }

    pub fn depends_on<I, D>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    pub fn max_init_retries(mut self, retries: u32) -> Self {
        self.max_init_retries = retries;
        self
    }

    pub(crate) fn build_facade(&self, config: &OrchestratorConfig) -> Result<Arc<dyn Facade>, BoxError> {
        (self.build)(&self.name, config)
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("critical", &self.critical)
            .field("health_check_interval", &self.health_check_interval)
            .field("max_init_retries", &self.max_init_retries)
            .finish_non_exhaustive()
    }
}

/// Registered services, in registration order.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    services: Vec<Arc<ServiceConfig>>,
}

impl Registry {
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ServiceConfig>> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn insert(&mut self, config: Arc<ServiceConfig>) {
        self.services.push(config);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ServiceConfig>> {
        self.services.iter()
    }

    pub fn snapshot(&self) -> Vec<Arc<ServiceConfig>> {
        self.services.clone()
    }
}
