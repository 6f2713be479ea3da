//! Concrete facades over counting collaborators.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use service_resilience::facade::{ChatFacade, DocumentFacade, Facade, FeedsFacade};
use service_resilience::health::ServiceHealth;
use service_resilience::resilience::CircuitState;
use service_resilience::services::memory::{InMemoryDocuments, InMemoryFeeds};
use service_resilience::services::{
    ChatService, Document, DocumentService, DocumentSummary, Feed, FeedItem, FeedService,
    NewDocument, QueryAnswer, TokenStream,
};
use service_resilience::{BoxError, FacadeError, OrchestratorConfig};

#[derive(Default)]
struct CountingDocs {
    inner: InMemoryDocuments,
    lists: AtomicU32,
    queries: AtomicU32,
}

#[async_trait]
impl DocumentService for CountingDocs {
    async fn ingest(&self, document: NewDocument) -> Result<DocumentSummary, BoxError> {
        self.inner.ingest(document).await
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, BoxError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list_documents().await
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>, BoxError> {
        self.inner.get_document(id).await
    }

    async fn query(&self, question: &str, top_k: usize) -> Result<QueryAnswer, BoxError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query(question, top_k).await
    }

    async fn delete_document(&self, id: &str) -> Result<bool, BoxError> {
        self.inner.delete_document(id).await
    }
}

struct CountingFeeds {
    inner: InMemoryFeeds,
    fetches: AtomicU32,
}

#[async_trait]
impl FeedService for CountingFeeds {
    async fn list_feeds(&self) -> Result<Vec<Feed>, BoxError> {
        self.inner.list_feeds().await
    }

    async fn fetch_items(&self, url: &str, limit: usize) -> Result<Vec<FeedItem>, BoxError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_items(url, limit).await
    }

    async fn cached_items(&self) -> Result<Vec<FeedItem>, BoxError> {
        self.inner.cached_items().await
    }

    async fn refresh(&self) -> Result<usize, BoxError> {
        self.inner.refresh().await
    }

    async fn add_feed(&self, url: &str, title: Option<&str>) -> Result<Feed, BoxError> {
        self.inner.add_feed(url, title).await
    }

    async fn remove_feed(&self, url: &str) -> Result<bool, BoxError> {
        self.inner.remove_feed(url).await
    }
}

/// Chat backend whose generate always fails and whose streams never yield.
#[derive(Default)]
struct BrokenChat {
    generates: AtomicU32,
    hook: Option<bool>,
}

#[async_trait]
impl ChatService for BrokenChat {
    async fn generate(&self, _prompt: &str) -> Result<String, BoxError> {
        self.generates.fetch_add(1, Ordering::SeqCst);
        Err("model overloaded".into())
    }

    async fn stream(&self, _prompt: &str) -> Result<TokenStream, BoxError> {
        Ok(stream::pending().boxed())
    }

    async fn list_models(&self) -> Result<Vec<String>, BoxError> {
        Ok(vec!["broken".to_string()])
    }

    async fn health(&self) -> Option<Result<bool, BoxError>> {
        self.hook.map(Ok)
    }
}

fn documents() -> (Arc<CountingDocs>, Arc<DocumentFacade>) {
    let service = Arc::new(CountingDocs::default());
    let facade = DocumentFacade::new("documents", service.clone(), &OrchestratorConfig::default());
    (service, Arc::new(facade))
}

fn feeds() -> (Arc<CountingFeeds>, Arc<FeedsFacade>) {
    let service = Arc::new(CountingFeeds {
        inner: InMemoryFeeds::new().with_items("https://news.example/rss", &["one", "two", "three"]),
        fetches: AtomicU32::new(0),
    });
    let facade = FeedsFacade::new("feeds", service.clone(), &OrchestratorConfig::default());
    (service, Arc::new(facade))
}

#[tokio::test(start_paused = true)]
async fn document_mutations_invalidate_listing() {
    let (service, facade) = documents();
    facade.ingest(NewDocument::new("a", "alpha content")).await.unwrap();

    assert_eq!(facade.list_documents().await.unwrap().len(), 1);
    assert_eq!(facade.list_documents().await.unwrap().len(), 1);
    assert_eq!(service.lists.load(Ordering::SeqCst), 1);

    let second = facade.ingest(NewDocument::new("b", "beta content")).await.unwrap();
    assert_eq!(facade.list_documents().await.unwrap().len(), 2);
    assert_eq!(service.lists.load(Ordering::SeqCst), 2);

    assert!(facade.delete_document(&second.id).await.unwrap());
    assert_eq!(facade.list_documents().await.unwrap().len(), 1);
    assert_eq!(service.lists.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn queries_are_cached_per_question_and_top_k() {
    let (service, facade) = documents();
    facade
        .ingest(NewDocument::new("rust", "ownership and borrowing in rust"))
        .await
        .unwrap();

    facade.query("what is ownership", 3).await.unwrap();
    facade.query("what is ownership", 3).await.unwrap();
    assert_eq!(service.queries.load(Ordering::SeqCst), 1);

    facade.query("what is ownership", 5).await.unwrap();
    assert_eq!(service.queries.load(Ordering::SeqCst), 2);

    tokio::time::advance(Duration::from_secs(301)).await;
    facade.query("what is ownership", 3).await.unwrap();
    assert_eq!(service.queries.load(Ordering::SeqCst), 3);

    facade.ingest(NewDocument::new("more", "lifetimes")).await.unwrap();
    facade.query("what is ownership", 3).await.unwrap();
    assert_eq!(service.queries.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn failed_ingest_in_batch_is_none() {
    let (_, facade) = documents();
    let results = facade
        .ingest_many(vec![
            NewDocument::new("one", "first body"),
            NewDocument::new("empty", ""),
            NewDocument::new("two", "second body"),
        ])
        .await;

    assert!(results[0].is_some());
    assert!(results[1].is_none());
    assert_eq!(results[2].as_ref().map(|s| s.title.as_str()), Some("two"));
    assert_eq!(facade.list_documents().await.unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn feed_items_are_cached_until_refresh() {
    let (service, facade) = feeds();
    let url = "https://news.example/rss";

    assert_eq!(facade.fetch_items(url, 2).await.unwrap().len(), 2);
    assert_eq!(facade.fetch_items(url, 2).await.unwrap().len(), 2);
    assert_eq!(service.fetches.load(Ordering::SeqCst), 1);

    assert_eq!(facade.refresh().await.unwrap(), 3);
    facade.fetch_items(url, 2).await.unwrap();
    assert_eq!(service.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn subscription_changes_invalidate_feed_list() {
    let (_, facade) = feeds();
    assert_eq!(facade.list_feeds().await.unwrap().len(), 1);

    facade.add_feed("https://blog.example/atom", Some("Blog")).await.unwrap();
    assert_eq!(facade.list_feeds().await.unwrap().len(), 2);

    assert!(facade.remove_feed("https://blog.example/atom").await.unwrap());
    assert_eq!(facade.list_feeds().await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn unsubscribed_fetch_fails_per_item_in_batch() {
    let (_, facade) = feeds();
    let results = facade
        .fetch_many(
            vec![
                "https://news.example/rss".to_string(),
                "https://unknown.example/rss".to_string(),
            ],
            10,
        )
        .await;
    assert_eq!(results[0].as_ref().map(Vec::len), Some(3));
    assert!(results[1].is_none());
}

#[tokio::test(start_paused = true)]
async fn feeds_health_check_does_not_fetch_upstream() {
    let (service, facade) = feeds();
    assert_eq!(facade.health_check().await, ServiceHealth::Healthy);
    assert_eq!(service.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn silent_chat_stream_reports_degraded() {
    let facade = ChatFacade::new("chat", Arc::new(BrokenChat::default()), &OrchestratorConfig::default());
    assert_eq!(facade.health_check().await, ServiceHealth::Degraded);
    assert_eq!(facade.get_metrics().metrics.last_health, ServiceHealth::Degraded);
}

#[tokio::test(start_paused = true)]
async fn chat_health_hook_wins_over_stream_check() {
    let service = BrokenChat {
        hook: Some(true),
        ..BrokenChat::default()
    };
    let facade = ChatFacade::new("chat", Arc::new(service), &OrchestratorConfig::default());
    assert_eq!(facade.health_check().await, ServiceHealth::Healthy);
}

#[tokio::test(start_paused = true)]
async fn chat_generate_retries_then_opens_breaker() {
    let mut config = OrchestratorConfig::default();
    config.circuit_breaker.failure_threshold = 2;
    let service = Arc::new(BrokenChat::default());
    let facade = ChatFacade::new("chat", service.clone(), &config);

    match facade.generate("hello").await {
        Err(FacadeError::Service(e)) => assert_eq!(e.to_string(), "model overloaded"),
        other => panic!("expected service error, got {:?}", other),
    }
    assert_eq!(service.generates.load(Ordering::SeqCst), 2);

    assert!(matches!(
        facade.generate("hello").await,
        Err(FacadeError::CircuitOpen { .. })
    ));
    assert_eq!(service.generates.load(Ordering::SeqCst), 2);

    let snapshot = facade.get_metrics();
    assert_eq!(snapshot.circuit.state, CircuitState::Open);
    assert_eq!(snapshot.metrics.rejected_requests, 1);
    assert_eq!(facade.health_check().await, ServiceHealth::Unhealthy);
}

#[tokio::test(start_paused = true)]
async fn model_list_is_cached() {
    let facade = ChatFacade::new("chat", Arc::new(BrokenChat::default()), &OrchestratorConfig::default());
    assert_eq!(facade.list_models().await.unwrap(), vec!["broken"]);
    facade.list_models().await.unwrap();

    let metrics = facade.get_metrics();
    assert_eq!(metrics.metrics.cache_hits, 1);
    assert_eq!(metrics.metrics.cache_misses, 1);
    assert_eq!(metrics.cache_entries, 1);

    facade.clear_cache();
    assert_eq!(facade.get_metrics().cache_entries, 0);
}
