//! In-memory collaborators.
//!
//! Deterministic stand-ins used by the binary when no real backends are
//! wired in. They hold data in process and never touch the network.

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream::{self, StreamExt};
use std::time::{SystemTime, UNIX_EPOCH};

use super::{
    ChatService, Chunk, Document, DocumentService, DocumentSummary, Feed, FeedItem, FeedService,
    NewDocument, QueryAnswer, ScoredChunk, TokenStream,
};
use crate::error::BoxError;

const CHUNK_WORDS: usize = 64;

/// Echoing chat backend.
#[derive(Debug, Clone)]
pub struct EchoChat {
    models: Vec<String>,
}

impl EchoChat {
    pub fn new() -> Self {
        Self {
            models: vec!["echo-small".to_string(), "echo-large".to_string()],
        }
    }

    fn reply(prompt: &str) -> String {
        format!("You said: {}", prompt.trim())
    }
}

impl Default for EchoChat {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatService for EchoChat {
    async fn generate(&self, prompt: &str) -> Result<String, BoxError> {
        Ok(Self::reply(prompt))
    }

    async fn stream(&self, prompt: &str) -> Result<TokenStream, BoxError> {
        let tokens: Vec<Result<String, BoxError>> = Self::reply(prompt)
            .split_inclusive(' ')
            .map(|t| Ok(t.to_string()))
            .collect();
        Ok(stream::iter(tokens).boxed())
    }

    async fn list_models(&self) -> Result<Vec<String>, BoxError> {
        Ok(self.models.clone())
    }
}

/// Keyword-matching document store.
#[derive(Debug, Default)]
pub struct InMemoryDocuments {
    docs: DashMap<String, Document>,
}

impl InMemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    fn chunk(document_id: &str, content: &str) -> Vec<Chunk> {
        let words: Vec<&str> = content.split_whitespace().collect();
        words
            .chunks(CHUNK_WORDS)
            .enumerate()
            .map(|(index, words)| Chunk {
                document_id: document_id.to_string(),
                index,
                text: words.join(" "),
            })
            .collect()
    }

    fn score(terms: &[String], text: &str) -> f32 {
        if terms.is_empty() {
            return 0.0;
        }
        let text = text.to_lowercase();
        let hits = terms.iter().filter(|t| text.contains(t.as_str())).count();
        hits as f32 / terms.len() as f32
    }
}

#[async_trait]
impl DocumentService for InMemoryDocuments {
    async fn ingest(&self, document: NewDocument) -> Result<DocumentSummary, BoxError> {
        if document.content.trim().is_empty() {
            return Err("document has no content".into());
        }
        let id = uuid::Uuid::new_v4().to_string();
        let doc = Document {
            chunks: Self::chunk(&id, &document.content),
            id: id.clone(),
            title: document.title,
            content: document.content,
        };
        let summary = doc.summary();
        self.docs.insert(id, doc);
        Ok(summary)
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, BoxError> {
        let mut list: Vec<DocumentSummary> = self.docs.iter().map(|d| d.summary()).collect();
        list.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(list)
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>, BoxError> {
        Ok(self.docs.get(id).map(|d| d.value().clone()))
    }

    async fn query(&self, question: &str, top_k: usize) -> Result<QueryAnswer, BoxError> {
        let terms: Vec<String> = question
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 2)
            .map(str::to_lowercase)
            .collect();

        let mut scored: Vec<ScoredChunk> = self
            .docs
            .iter()
            .flat_map(|d| d.chunks.clone())
            .filter_map(|chunk| {
                let score = Self::score(&terms, &chunk.text);
                (score > 0.0).then_some(ScoredChunk { chunk, score })
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);

        let answer = match scored.first() {
            Some(best) => best.chunk.text.clone(),
            None => "No relevant documents found.".to_string(),
        };
        Ok(QueryAnswer {
            answer,
            sources: scored,
        })
    }

    async fn delete_document(&self, id: &str) -> Result<bool, BoxError> {
        Ok(self.docs.remove(id).is_some())
    }
}

/// Feed store whose "network" is a fixed set of items per feed.
#[derive(Debug, Default)]
pub struct InMemoryFeeds {
    feeds: DashMap<String, Feed>,
    upstream: DashMap<String, Vec<FeedItem>>,
    held: DashMap<String, Vec<FeedItem>>,
}

impl InMemoryFeeds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `url` publishes `titles`.
    pub fn with_items(self, url: &str, titles: &[&str]) -> Self {
        let published = unix_now();
        let items = titles
            .iter()
            .enumerate()
            .map(|(i, title)| FeedItem {
                feed_url: url.to_string(),
                title: title.to_string(),
                link: format!("{}#{}", url.trim_end_matches('/'), i),
                published,
            })
            .collect();
        self.upstream.insert(url.to_string(), items);
        self.feeds.entry(url.to_string()).or_insert_with(|| Feed {
            url: url.to_string(),
            title: url.to_string(),
        });
        self
    }

    fn pull(&self, url: &str) -> Vec<FeedItem> {
        let items = self
            .upstream
            .get(url)
            .map(|i| i.value().clone())
            .unwrap_or_default();
        self.held.insert(url.to_string(), items.clone());
        items
    }
}

#[async_trait]
impl FeedService for InMemoryFeeds {
    async fn list_feeds(&self) -> Result<Vec<Feed>, BoxError> {
        let mut feeds: Vec<Feed> = self.feeds.iter().map(|f| f.value().clone()).collect();
        feeds.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(feeds)
    }

    async fn fetch_items(&self, url: &str, limit: usize) -> Result<Vec<FeedItem>, BoxError> {
        if !self.feeds.contains_key(url) {
            return Err(format!("not subscribed to {}", url).into());
        }
        let mut items = self.pull(url);
        items.truncate(limit);
        Ok(items)
    }

    async fn cached_items(&self) -> Result<Vec<FeedItem>, BoxError> {
        Ok(self.held.iter().flat_map(|e| e.value().clone()).collect())
    }

    async fn refresh(&self) -> Result<usize, BoxError> {
        let urls: Vec<String> = self.feeds.iter().map(|f| f.key().clone()).collect();
        Ok(urls.iter().map(|url| self.pull(url).len()).sum())
    }

    async fn add_feed(&self, url: &str, title: Option<&str>) -> Result<Feed, BoxError> {
        if url.trim().is_empty() {
            return Err("feed url must not be empty".into());
        }
        let feed = Feed {
            url: url.to_string(),
            title: title.unwrap_or(url).to_string(),
        };
        self.feeds.insert(url.to_string(), feed.clone());
        Ok(feed)
    }

    async fn remove_feed(&self, url: &str) -> Result<bool, BoxError> {
        self.held.remove(url);
        Ok(self.feeds.remove(url).is_some())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_stream_reassembles_reply() {
        let chat = EchoChat::new();
        let tokens: Vec<String> = chat
            .stream("hello there")
            .await
            .unwrap()
            .map(|t| t.unwrap())
            .collect()
            .await;
        assert_eq!(tokens.concat(), chat.generate("hello there").await.unwrap());
    }

    #[tokio::test]
    async fn query_ranks_matching_chunks() {
        let docs = InMemoryDocuments::new();
        docs.ingest(NewDocument::new("rust", "Rust has ownership and borrowing"))
            .await
            .unwrap();
        docs.ingest(NewDocument::new("go", "Go has goroutines"))
            .await
            .unwrap();

        let answer = docs.query("what is ownership?", 3).await.unwrap();
        assert_eq!(answer.sources.len(), 1);
        assert!(answer.answer.contains("ownership"));
    }

    #[tokio::test]
    async fn empty_document_is_rejected() {
        let docs = InMemoryDocuments::new();
        assert!(docs.ingest(NewDocument::new("blank", "   ")).await.is_err());
    }

    #[tokio::test]
    async fn cached_items_only_reflect_fetched_feeds() {
        let feeds = InMemoryFeeds::new().with_items("https://a.example/rss", &["one", "two"]);
        assert!(feeds.cached_items().await.unwrap().is_empty());

        let items = feeds.fetch_items("https://a.example/rss", 1).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(feeds.cached_items().await.unwrap().len(), 2);
    }
}
