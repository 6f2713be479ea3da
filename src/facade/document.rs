//! Document facade.
//!
//! # Cache namespaces
//! - `documents`: the listing and single-document lookups
//! - `query`: answers, keyed by a hash of question and `top_k`
//!
//! Ingest and delete invalidate both, since a changed corpus changes answers.

use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use super::{BuildFacade, Facade, FacadeCore};
use crate::config::{DocumentConfig, OrchestratorConfig};
use crate::error::{BoxError, FacadeError};
use crate::resilience::{cache_key, RetryPolicy};
use crate::services::{Document, DocumentService, DocumentSummary, NewDocument, QueryAnswer};

const DOCUMENTS: &str = "documents";
const QUERY: &str = "query";

pub struct DocumentFacade {
    core: FacadeCore,
    service: Arc<dyn DocumentService>,
    tuning: DocumentConfig,
}

impl DocumentFacade {
    pub fn new(name: &str, service: Arc<dyn DocumentService>, config: &OrchestratorConfig) -> Self {
        Self {
            core: FacadeCore::new(name, config),
            service,
            tuning: config.documents.clone(),
        }
    }

    fn policy(&self) -> RetryPolicy {
        self.core.policy(self.tuning.max_retries, self.tuning.base_delay_ms)
    }

    fn invalidate(&self) {
        self.core.invalidate_namespace(DOCUMENTS);
        self.core.invalidate_namespace(QUERY);
    }

    pub async fn ingest(&self, document: NewDocument) -> Result<DocumentSummary, FacadeError> {
        let summary = self
            .core
            .call("ingest", &self.policy(), || self.service.ingest(document.clone()))
            .await?;
        self.invalidate();
        tracing::info!(service = %self.core.name(), id = %summary.id, chunks = summary.chunk_count, "Document ingested");
        Ok(summary)
    }

    /// Ingest several documents over the worker pool. Failed items are `None`.
    pub async fn ingest_many(
        self: &Arc<Self>,
        documents: Vec<NewDocument>,
    ) -> Vec<Option<DocumentSummary>> {
        let operations: Vec<_> = documents
            .into_iter()
            .map(|document| {
                let this = Arc::clone(self);
                move || async move { this.ingest(document).await }
            })
            .collect();
        self.core.batch_execute(operations).await
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>, FacadeError> {
        let ttl = Duration::from_secs(self.tuning.list_ttl_secs);
        let policy = self.policy();
        self.core
            .cached("documents:all", ttl, || {
                self.core
                    .call("list_documents", &policy, || self.service.list_documents())
            })
            .await
    }

    pub async fn get_document(&self, id: &str) -> Result<Option<Document>, FacadeError> {
        let ttl = Duration::from_secs(self.tuning.list_ttl_secs);
        let policy = self.policy();
        let key = format!("{}:id:{}", DOCUMENTS, id);
        self.core
            .cached(&key, ttl, || {
                self.core
                    .call("get_document", &policy, || self.service.get_document(id))
            })
            .await
    }

    pub async fn query(&self, question: &str, top_k: usize) -> Result<QueryAnswer, FacadeError> {
        let ttl = Duration::from_secs(self.tuning.query_ttl_secs);
        let policy = self.policy();
        let key = cache_key(QUERY, &(question, top_k));
        self.core
            .cached(&key, ttl, || {
                self.core
                    .call("query", &policy, || self.service.query(question, top_k))
            })
            .await
    }

    pub async fn delete_document(&self, id: &str) -> Result<bool, FacadeError> {
        let removed = self
            .core
            .call("delete_document", &self.policy(), || self.service.delete_document(id))
            .await?;
        self.invalidate();
        Ok(removed)
    }
}

#[async_trait]
impl Facade for DocumentFacade {
    fn core(&self) -> &FacadeCore {
        &self.core
    }

    async fn basic_health_check(&self) -> Result<bool, BoxError> {
        if let Some(result) = self.service.health().await {
            return result;
        }
        self.service.list_documents().await.map(|_| true)
    }

    async fn shutdown(&self) -> Result<(), BoxError> {
        self.service.shutdown().await
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl BuildFacade for DocumentFacade {
    type Service = dyn DocumentService;

    fn build(
        name: &str,
        service: Arc<dyn DocumentService>,
        config: &OrchestratorConfig,
    ) -> Result<Self, BoxError> {
        Ok(Self::new(name, service, config))
    }
}
