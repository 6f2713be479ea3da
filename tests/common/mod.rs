//! Shared utilities for the integration tests.
//!
//! `ScriptedService` is a collaborator whose health check and shutdown behavior can
//! be changed mid-test; `ScriptedFacade` wraps it the same way the real
//! facades wrap theirs.
#![allow(dead_code)]

use async_trait::async_trait;
use std::any::Any;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use service_resilience::config::OrchestratorConfig;
use service_resilience::facade::{BuildFacade, Facade, FacadeConstructor, FacadeCore};
use service_resilience::BoxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    /// Health check answers `Ok(value)`.
    Report(bool),
    Fail,
    Hang,
    Panic,
}

#[derive(Debug)]
pub struct ScriptedService {
    health: Mutex<Behavior>,
    shutdown: Mutex<Behavior>,
    pub checks: AtomicU32,
    pub shutdowns: AtomicU32,
}

impl ScriptedService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            health: Mutex::new(Behavior::Succeed),
            shutdown: Mutex::new(Behavior::Succeed),
            checks: AtomicU32::new(0),
            shutdowns: AtomicU32::new(0),
        })
    }

    pub fn with_health(behavior: Behavior) -> Arc<Self> {
        let service = Self::new();
        service.set_health(behavior);
        service
    }

    pub fn set_health(&self, behavior: Behavior) {
        *self.health.lock().unwrap() = behavior;
    }

    pub fn set_shutdown(&self, behavior: Behavior) {
        *self.shutdown.lock().unwrap() = behavior;
    }

    pub fn check_count(&self) -> u32 {
        self.checks.load(Ordering::SeqCst)
    }

    async fn act(behavior: Behavior) -> Result<bool, BoxError> {
        match behavior {
            Behavior::Succeed => Ok(true),
            Behavior::Report(value) => Ok(value),
            Behavior::Fail => Err("scripted failure".into()),
            Behavior::Hang => std::future::pending().await,
            Behavior::Panic => panic!("scripted panic"),
        }
    }

    pub async fn check(&self) -> Result<bool, BoxError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.health.lock().unwrap();
        Self::act(behavior).await
    }

    pub async fn stop(&self) -> Result<(), BoxError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.shutdown.lock().unwrap();
        Self::act(behavior).await.map(|_| ())
    }
}

pub struct ScriptedFacade {
    core: FacadeCore,
    pub service: Arc<ScriptedService>,
}

#[async_trait]
impl Facade for ScriptedFacade {
    fn core(&self) -> &FacadeCore {
        &self.core
    }

    async fn basic_health_check(&self) -> Result<bool, BoxError> {
        self.service.check().await
    }

    async fn shutdown(&self) -> Result<(), BoxError> {
        self.service.stop().await
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl BuildFacade for ScriptedFacade {
    type Service = ScriptedService;

    fn build(
        name: &str,
        service: Arc<ScriptedService>,
        config: &OrchestratorConfig,
    ) -> Result<Self, BoxError> {
        Ok(Self {
            core: FacadeCore::new(name, config),
            service,
        })
    }
}

pub fn scripted() -> FacadeConstructor<ScriptedService> {
    FacadeConstructor::of::<ScriptedFacade>()
}

/// A constructor that always fails, counting its attempts.
pub fn failing_constructor(attempts: Arc<AtomicU32>) -> FacadeConstructor<ScriptedService> {
    FacadeConstructor::factory(move |_name: &str, _service: Arc<ScriptedService>, _config: &OrchestratorConfig| {
        attempts.fetch_add(1, Ordering::SeqCst);
        Err::<Arc<dyn Facade>, BoxError>("construction refused".into())
    })
}

/// Config with the background loops off so tests drive every cycle.
pub fn test_config() -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default();
    config.monitor.enabled = false;
    config
}

pub async fn advance(duration: Duration) {
    tokio::time::advance(duration).await;
}
