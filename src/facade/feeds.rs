//! Feeds facade.
//!
//! Feed content changes slowly and upstream fetches are the flakiest calls
//! in the system: three retries with a 2s base delay, and long TTLs.
//!
//! # Cache namespaces
//! - `feeds`: the subscription list
//! - `items`: fetched items, keyed by a hash of url and limit

use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use super::{BuildFacade, Facade, FacadeCore};
use crate::config::{FeedsConfig, OrchestratorConfig};
use crate::error::{BoxError, FacadeError};
use crate::resilience::{cache_key, RetryPolicy};
use crate::services::{Feed, FeedItem, FeedService};

const FEEDS: &str = "feeds";
const ITEMS: &str = "items";

pub struct FeedsFacade {
    core: FacadeCore,
    service: Arc<dyn FeedService>,
    tuning: FeedsConfig,
}

impl FeedsFacade {
    pub fn new(name: &str, service: Arc<dyn FeedService>, config: &OrchestratorConfig) -> Self {
        Self {
            core: FacadeCore::new(name, config),
            service,
            tuning: config.feeds.clone(),
        }
    }

    fn policy(&self) -> RetryPolicy {
        self.core.policy(self.tuning.max_retries, self.tuning.base_delay_ms)
    }

    pub async fn list_feeds(&self) -> Result<Vec<Feed>, FacadeError> {
        let ttl = Duration::from_secs(self.tuning.feeds_ttl_secs);
        let policy = self.policy();
        self.core
            .cached("feeds:all", ttl, || {
                self.core
                    .call("list_feeds", &policy, || self.service.list_feeds())
            })
            .await
    }

    pub async fn fetch_items(&self, url: &str, limit: usize) -> Result<Vec<FeedItem>, FacadeError> {
        let ttl = Duration::from_secs(self.tuning.items_ttl_secs);
        let policy = self.policy();
        let key = cache_key(ITEMS, &(url, limit));
        self.core
            .cached(&key, ttl, || {
                self.core
                    .call("fetch_items", &policy, || self.service.fetch_items(url, limit))
            })
            .await
    }

    /// Fetch several feeds over the worker pool. Failed feeds are `None`.
    pub async fn fetch_many(
        self: &Arc<Self>,
        urls: Vec<String>,
        limit: usize,
    ) -> Vec<Option<Vec<FeedItem>>> {
        let operations: Vec<_> = urls
            .into_iter()
            .map(|url| {
                let this = Arc::clone(self);
                move || async move { this.fetch_items(&url, limit).await }
            })
            .collect();
        self.core.batch_execute(operations).await
    }

    /// Re-fetch every feed and drop cached items.
    pub async fn refresh(&self) -> Result<usize, FacadeError> {
        let count = self
            .core
            .call("refresh", &self.policy(), || self.service.refresh())
            .await?;
        self.core.invalidate_namespace(ITEMS);
        tracing::info!(service = %self.core.name(), items = count, "Feeds refreshed");
        Ok(count)
    }

    pub async fn add_feed(&self, url: &str, title: Option<&str>) -> Result<Feed, FacadeError> {
        let feed = self
            .core
            .call("add_feed", &RetryPolicy::none(), || self.service.add_feed(url, title))
            .await?;
        self.core.invalidate_namespace(FEEDS);
        self.core.invalidate_namespace(ITEMS);
        Ok(feed)
    }

    pub async fn remove_feed(&self, url: &str) -> Result<bool, FacadeError> {
        let removed = self
            .core
            .call("remove_feed", &RetryPolicy::none(), || self.service.remove_feed(url))
            .await?;
        self.core.invalidate_namespace(FEEDS);
        self.core.invalidate_namespace(ITEMS);
        Ok(removed)
    }
}

#[async_trait]
impl Facade for FeedsFacade {
    fn core(&self) -> &FacadeCore {
        &self.core
    }

    /// Lists locally held items; never triggers an upstream fetch.
    async fn basic_health_check(&self) -> Result<bool, BoxError> {
        if let Some(result) = self.service.health().await {
            return result;
        }
        self.service.cached_items().await.map(|_| true)
    }

    async fn shutdown(&self) -> Result<(), BoxError> {
        self.service.shutdown().await
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl BuildFacade for FeedsFacade {
    type Service = dyn FeedService;

    fn build(
        name: &str,
        service: Arc<dyn FeedService>,
        config: &OrchestratorConfig,
    ) -> Result<Self, BoxError> {
        Ok(Self::new(name, service, config))
    }
}
