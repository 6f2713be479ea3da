//! Chat facade.
//!
//! Generation is interactive, so retry budgets are short: one retry with a
//! 500ms base delay. Streams are retried only while opening; once tokens
//! flow, errors go straight to the caller.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use super::{BuildFacade, Facade, FacadeCore};
use crate::config::{ChatConfig, OrchestratorConfig};
use crate::error::{BoxError, FacadeError};
use crate::services::{ChatService, TokenStream};

const PROBE_PROMPT: &str = "ping";

pub struct ChatFacade {
    core: FacadeCore,
    service: Arc<dyn ChatService>,
    tuning: ChatConfig,
}

impl ChatFacade {
    pub fn new(name: &str, service: Arc<dyn ChatService>, config: &OrchestratorConfig) -> Self {
        Self {
            core: FacadeCore::new(name, config),
            service,
            tuning: config.chat.clone(),
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, FacadeError> {
        let policy = self.core.policy(self.tuning.max_retries, self.tuning.base_delay_ms);
        self.core
            .call("generate", &policy, || self.service.generate(prompt))
            .await
    }

    pub async fn stream(&self, prompt: &str) -> Result<TokenStream, FacadeError> {
        let policy = self.core.policy(self.tuning.max_retries, self.tuning.base_delay_ms);
        self.core
            .call("stream", &policy, || self.service.stream(prompt))
            .await
    }

    pub async fn list_models(&self) -> Result<Vec<String>, FacadeError> {
        let ttl = Duration::from_secs(self.tuning.models_ttl_secs);
        let policy = self.core.policy(self.tuning.max_retries, self.tuning.base_delay_ms);
        self.core
            .cached("models:all", ttl, || {
                self.core
                    .call("list_models", &policy, || self.service.list_models())
            })
            .await
    }
}

#[async_trait]
impl Facade for ChatFacade {
    fn core(&self) -> &FacadeCore {
        &self.core
    }

    /// The service's own hook if it has one, otherwise the first token of a
    /// short stream. A stream that opens but stays silent is degraded.
    async fn basic_health_check(&self) -> Result<bool, BoxError> {
        if let Some(result) = self.service.health().await {
            return result;
        }

        let mut stream = self.service.stream(PROBE_PROMPT).await?;
        let wait = Duration::from_secs(self.tuning.probe_token_timeout_secs);
        match tokio::time::timeout(wait, stream.next()).await {
            Ok(Some(Ok(_))) => Ok(true),
            Ok(Some(Err(e))) => Err(e),
            Ok(None) => Ok(false),
            Err(_) => {
                tracing::debug!(service = %self.core.name(), wait = ?wait, "No token before probe deadline");
                Ok(false)
            }
        }
    }

    async fn shutdown(&self) -> Result<(), BoxError> {
        self.service.shutdown().await
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl BuildFacade for ChatFacade {
    type Service = dyn ChatService;

    fn build(
        name: &str,
        service: Arc<dyn ChatService>,
        config: &OrchestratorConfig,
    ) -> Result<Self, BoxError> {
        Ok(Self::new(name, service, config))
    }
}
