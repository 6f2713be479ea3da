//! Composition root.
//!
//! Turns the `[[services]]` section of the configuration plus the raw
//! service instances supplied by the caller into a registered orchestrator.
//! The orchestrator is returned uninitialized; the caller decides when to
//! run [`initialize_services`](ServiceOrchestrator::initialize_services).

use std::sync::Arc;
use std::time::Duration;

use super::{ServiceConfig, ServiceOrchestrator};
use crate::config::{OrchestratorConfig, ServiceDefinition, ServiceKind};
use crate::error::{OrchestratorError, Result};
use crate::facade::{ChatFacade, DocumentFacade, FacadeConstructor, FeedsFacade};
use crate::services::{ChatService, DocumentService, FeedService};

/// Raw collaborators handed over by the application bootstrap.
#[derive(Clone, Default)]
pub struct ServiceInstances {
    pub chat: Option<Arc<dyn ChatService>>,
    pub documents: Option<Arc<dyn DocumentService>>,
    pub feeds: Option<Arc<dyn FeedService>>,
}

pub struct ServiceFactory;

impl ServiceFactory {
    /// Register every declared service in declaration order.
    ///
    /// A declared service without an instance is an error when critical and
    /// skipped with a warning otherwise.
    pub async fn create(
        config: OrchestratorConfig,
        instances: ServiceInstances,
    ) -> Result<ServiceOrchestrator> {
        let definitions = config.services.clone();
        let orchestrator = ServiceOrchestrator::new(config);

        for definition in &definitions {
            let service = match definition.kind {
                ServiceKind::Chat => instances.chat.clone().map(|s| {
                    ServiceConfig::new(&definition.name, s, FacadeConstructor::of::<ChatFacade>())
                }),
                ServiceKind::Documents => instances.documents.clone().map(|s| {
                    ServiceConfig::new(&definition.name, s, FacadeConstructor::of::<DocumentFacade>())
                }),
                ServiceKind::Feeds => instances.feeds.clone().map(|s| {
                    ServiceConfig::new(&definition.name, s, FacadeConstructor::of::<FeedsFacade>())
                }),
            };

            let Some(service) = service else {
                if definition.critical {
                    return Err(OrchestratorError::Initialization {
                        service: definition.name.clone(),
                        reason: format!("no {:?} service instance supplied", definition.kind),
                    });
                }
                tracing::warn!(
                    service = %definition.name,
                    kind = ?definition.kind,
                    "No instance supplied for non-critical service, skipping"
                );
                continue;
            };

            orchestrator.register(apply_definition(service, definition)).await?;
        }

        tracing::info!(services = definitions.len(), "Service factory finished registration");
        Ok(orchestrator)
    }
}

fn apply_definition(service: ServiceConfig, definition: &ServiceDefinition) -> ServiceConfig {
    service
        .depends_on(definition.dependencies.iter().cloned())
        .critical(definition.critical)
        .health_check_interval(Duration::from_secs(definition.health_check_interval_secs))
        .max_init_retries(definition.max_init_retries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::{EchoChat, InMemoryDocuments, InMemoryFeeds};

    fn all_instances() -> ServiceInstances {
        ServiceInstances {
            chat: Some(Arc::new(EchoChat::default())),
            documents: Some(Arc::new(InMemoryDocuments::default())),
            feeds: Some(Arc::new(InMemoryFeeds::default())),
        }
    }

    #[tokio::test]
    async fn default_config_registers_all_services() {
        let orchestrator = ServiceFactory::create(OrchestratorConfig::default(), all_instances())
            .await
            .unwrap();
        assert_eq!(orchestrator.service_names(), vec!["chat", "documents", "feeds"]);
        assert!(orchestrator.get_facade::<ChatFacade>("chat").is_some());
        assert!(orchestrator.get_facade::<FeedsFacade>("feeds").is_some());
        assert!(orchestrator.get_facade::<ChatFacade>("feeds").is_none());
    }

    #[tokio::test]
    async fn missing_critical_instance_is_an_error() {
        let instances = ServiceInstances {
            chat: None,
            ..all_instances()
        };
        let result = ServiceFactory::create(OrchestratorConfig::default(), instances).await;
        assert!(matches!(result, Err(OrchestratorError::Initialization { .. })));
    }

    #[tokio::test]
    async fn missing_optional_instance_is_skipped() {
        let instances = ServiceInstances {
            feeds: None,
            ..all_instances()
        };
        let orchestrator = ServiceFactory::create(OrchestratorConfig::default(), instances)
            .await
            .unwrap();
        assert_eq!(orchestrator.service_names(), vec!["chat", "documents"]);
    }
}
