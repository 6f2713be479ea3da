//! Collaborator service boundary.
//!
//! The orchestrator never implements chat, ingestion, or feed logic itself.
//! It wraps whatever implements these traits. Each trait carries two optional
//! hooks with defaults:
//!
//! - `health()` returns `None` when the service has no probe of its own, in
//!   which case the facade falls back to a cheap domain call.
//! - `shutdown()` is a no-op unless the service holds resources.

pub mod memory;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::BoxError;

/// A stream of generated tokens.
pub type TokenStream = BoxStream<'static, Result<String, BoxError>>;

/// Chat / text generation backend.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, BoxError>;

    /// Open a token stream for `prompt`.
    async fn stream(&self, prompt: &str) -> Result<TokenStream, BoxError>;

    async fn list_models(&self) -> Result<Vec<String>, BoxError>;

    async fn health(&self) -> Option<Result<bool, BoxError>> {
        None
    }

    async fn shutdown(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Document ingestion and retrieval backend.
#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn ingest(&self, document: NewDocument) -> Result<DocumentSummary, BoxError>;

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, BoxError>;

    async fn get_document(&self, id: &str) -> Result<Option<Document>, BoxError>;

    async fn query(&self, question: &str, top_k: usize) -> Result<QueryAnswer, BoxError>;

    /// Returns whether a document was removed.
    async fn delete_document(&self, id: &str) -> Result<bool, BoxError>;

    async fn health(&self) -> Option<Result<bool, BoxError>> {
        None
    }

    async fn shutdown(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Feed aggregation backend.
#[async_trait]
pub trait FeedService: Send + Sync {
    async fn list_feeds(&self) -> Result<Vec<Feed>, BoxError>;

    /// Fetch up to `limit` items from the feed at `url`. May hit the network.
    async fn fetch_items(&self, url: &str, limit: usize) -> Result<Vec<FeedItem>, BoxError>;

    /// Items already held locally. Must not force a network fetch.
    async fn cached_items(&self) -> Result<Vec<FeedItem>, BoxError>;

    /// Re-fetch every subscribed feed. Returns the number of items now held.
    async fn refresh(&self) -> Result<usize, BoxError>;

    async fn add_feed(&self, url: &str, title: Option<&str>) -> Result<Feed, BoxError>;

    async fn remove_feed(&self, url: &str) -> Result<bool, BoxError>;

    async fn health(&self) -> Option<Result<bool, BoxError>> {
        None
    }

    async fn shutdown(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// A document submitted for ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
}

impl NewDocument {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub chunks: Vec<Chunk>,
}

impl Document {
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            chunk_count: self.chunks.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub document_id: String,
    pub index: usize,
    pub text: String,
}

/// Answer to a retrieval query, with the chunks it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub sources: Vec<ScoredChunk>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub feed_url: String,
    pub title: String,
    pub link: String,
    /// Unix seconds.
    pub published: u64,
}
