// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementations of the storage-shaped ports: memory store,
//! vector store, embedding provider, scraper, and progress sink.
//!
//! These back both the test harness and the binary's default wiring when
//! no external backends are configured.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use newsmith_core::{
    AgentUpdate, CallOptions, Collection, ConversationContext, EmbeddingProvider, Filter,
    MemoryStore, NewsmithError, ProgressSink, ScrapeOutcome, ScrapedPage, Scraper, SimilarityHit,
    VectorRecord, VectorStore, WorkflowContext, PROGRESS_STREAM_CAP,
};

/// In-memory [`MemoryStore`].
#[derive(Default)]
pub struct InMemoryMemoryStore {
    conversations: Mutex<HashMap<String, ConversationContext>>,
    workflow_states: Mutex<HashMap<String, WorkflowContext>>,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn load_conversation(
        &self,
        user_id: &str,
        _opts: &CallOptions,
    ) -> Result<Option<ConversationContext>, NewsmithError> {
        Ok(self
            .conversations
            .lock()
            .expect("conversation map poisoned")
            .get(user_id)
            .cloned())
    }

    async fn save_conversation(
        &self,
        context: &ConversationContext,
        _opts: &CallOptions,
    ) -> Result<(), NewsmithError> {
        self.conversations
            .lock()
            .expect("conversation map poisoned")
            .insert(context.user_id.clone(), context.clone());
        Ok(())
    }

    async fn clear_conversation(
        &self,
        user_id: &str,
        _opts: &CallOptions,
    ) -> Result<(), NewsmithError> {
        self.conversations
            .lock()
            .expect("conversation map poisoned")
            .remove(user_id);
        Ok(())
    }

    async fn save_workflow_state(
        &self,
        context: &WorkflowContext,
        _opts: &CallOptions,
    ) -> Result<(), NewsmithError> {
        self.workflow_states
            .lock()
            .expect("workflow map poisoned")
            .insert(context.id.clone(), context.clone());
        Ok(())
    }

    async fn load_workflow_state(
        &self,
        workflow_id: &str,
        _opts: &CallOptions,
    ) -> Result<Option<WorkflowContext>, NewsmithError> {
        Ok(self
            .workflow_states
            .lock()
            .expect("workflow map poisoned")
            .get(workflow_id)
            .cloned())
    }
}

/// In-memory [`VectorStore`] using cosine similarity.
#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: Mutex<HashMap<Collection, Vec<VectorRecord>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_count(&self, collection: Collection) -> usize {
        self.collections
            .lock()
            .expect("collection map poisoned")
            .get(&collection)
            .map_or(0, Vec::len)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn store(
        &self,
        collection: Collection,
        records: Vec<VectorRecord>,
        _opts: &CallOptions,
    ) -> Result<(), NewsmithError> {
        let mut collections = self.collections.lock().expect("collection map poisoned");
        let existing = collections.entry(collection).or_default();
        for record in records {
            // Deterministic ids: a re-store replaces the old vector.
            existing.retain(|r| r.id != record.id);
            existing.push(record);
        }
        Ok(())
    }

    async fn query_similar(
        &self,
        collection: Collection,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&Filter>,
        _opts: &CallOptions,
    ) -> Result<Vec<SimilarityHit>, NewsmithError> {
        let collections = self.collections.lock().expect("collection map poisoned");
        let mut hits: Vec<SimilarityHit> = collections
            .get(&collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| filter.map_or(true, |f| f.matches(&record.metadata)))
                    .map(|record| {
                        let similarity = cosine_similarity(embedding, &record.embedding);
                        let distance = 1.0 - similarity;
                        SimilarityHit {
                            id: record.id.clone(),
                            document: record.document.clone(),
                            metadata: record.metadata.clone(),
                            similarity: (1.0 - distance).max(0.0),
                            distance,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn delete(
        &self,
        collection: Collection,
        ids: &[String],
        _opts: &CallOptions,
    ) -> Result<(), NewsmithError> {
        let mut collections = self.collections.lock().expect("collection map poisoned");
        if let Some(records) = collections.get_mut(&collection) {
            records.retain(|record| !ids.contains(&record.id));
        }
        Ok(())
    }
}

/// Deterministic embedding provider: hashes the text into a small vector.
pub struct HashEmbedder {
    fail_texts: Mutex<Vec<String>>,
    delay: Mutex<Duration>,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self {
            fail_texts: Mutex::new(Vec::new()),
            delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Any text containing `marker` will fail to embed.
    pub fn fail_on(&self, marker: impl Into<String>) {
        self.fail_texts
            .lock()
            .expect("fail list poisoned")
            .push(marker.into());
    }

    /// Adds artificial latency to every embed call.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().expect("delay poisoned") = delay;
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str, _opts: &CallOptions) -> Result<Vec<f32>, NewsmithError> {
        let delay = *self.delay.lock().expect("delay poisoned");
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
        let should_fail = self
            .fail_texts
            .lock()
            .expect("fail list poisoned")
            .iter()
            .any(|marker| text.contains(marker));
        if should_fail {
            return Err(NewsmithError::external(
                "EMBEDDING_ERROR",
                "scripted embedding failure",
            ));
        }
        // Cheap stable fingerprint; near-identical texts stay close.
        let mut vector = vec![0.0f32; 8];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % 8] += f32::from(byte) / 255.0;
        }
        Ok(vector)
    }
}

/// Mock scraper: scripted failures, otherwise synthesized page content.
pub struct MockScraper {
    fail_all: Mutex<bool>,
    fail_urls: Mutex<Vec<String>>,
}

impl MockScraper {
    pub fn new() -> Self {
        Self {
            fail_all: Mutex::new(false),
            fail_urls: Mutex::new(Vec::new()),
        }
    }

    /// Makes `scrape_many` fail wholesale, forcing per-URL retries.
    pub fn fail_batches(&self) {
        *self.fail_all.lock().expect("flag poisoned") = true;
    }

    pub fn fail_url(&self, url: impl Into<String>) {
        self.fail_urls.lock().expect("url list poisoned").push(url.into());
    }

    fn page_for(&self, url: &str) -> ScrapedPage {
        ScrapedPage {
            url: url.to_string(),
            title: format!("Scraped: {url}"),
            content: format!("Full body text scraped from {url}"),
            description: String::new(),
            author: None,
            published_at: None,
            image_url: None,
            tags: Vec::new(),
            success: true,
            error: None,
        }
    }
}

impl Default for MockScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scraper for MockScraper {
    async fn scrape(
        &self,
        url: &str,
        _deadline: Duration,
        _opts: &CallOptions,
    ) -> Result<ScrapedPage, NewsmithError> {
        let failing = self
            .fail_urls
            .lock()
            .expect("url list poisoned")
            .iter()
            .any(|u| u == url);
        if failing {
            return Err(NewsmithError::external("SCRAPER_ERROR", "scripted failure"));
        }
        Ok(self.page_for(url))
    }

    async fn scrape_many(
        &self,
        urls: &[String],
        _concurrency: usize,
        _per_url_timeout: Duration,
        _retries: u32,
        _opts: &CallOptions,
    ) -> Result<ScrapeOutcome, NewsmithError> {
        if *self.fail_all.lock().expect("flag poisoned") {
            return Err(NewsmithError::external(
                "SCRAPER_ERROR",
                "scripted batch failure",
            ));
        }
        let fail_urls = self.fail_urls.lock().expect("url list poisoned").clone();
        let mut outcome = ScrapeOutcome::default();
        for url in urls {
            if fail_urls.iter().any(|u| u == url) {
                outcome.failed.push(url.clone());
            } else {
                outcome.ok.push(self.page_for(url));
            }
        }
        Ok(outcome)
    }
}

/// Progress sink recording per-user streams with the 1024-entry cap.
#[derive(Default)]
pub struct RecordingProgressSink {
    streams: Mutex<HashMap<String, VecDeque<AgentUpdate>>>,
}

impl RecordingProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All updates published for a user, oldest first.
    pub fn events_for(&self, user_id: &str) -> Vec<AgentUpdate> {
        self.streams
            .lock()
            .expect("stream map poisoned")
            .get(user_id)
            .map(|stream| stream.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProgressSink for RecordingProgressSink {
    async fn publish(
        &self,
        user_id: &str,
        update: AgentUpdate,
        _opts: &CallOptions,
    ) -> Result<(), NewsmithError> {
        let mut streams = self.streams.lock().expect("stream map poisoned");
        let stream = streams.entry(user_id.to_string()).or_default();
        if stream.len() >= PROGRESS_STREAM_CAP {
            stream.pop_front();
        }
        stream.push_back(update);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn vector_store_replaces_on_duplicate_id() {
        let store = InMemoryVectorStore::new();
        let opts = CallOptions::unbounded();
        let record = |v: f32| VectorRecord {
            id: "same".to_string(),
            document: "doc".to_string(),
            metadata: Default::default(),
            embedding: vec![v, 0.0],
        };
        store
            .store(Collection::Articles, vec![record(1.0)], &opts)
            .await
            .unwrap();
        store
            .store(Collection::Articles, vec![record(0.5)], &opts)
            .await
            .unwrap();
        assert_eq!(store.record_count(Collection::Articles), 1);
    }

    #[tokio::test]
    async fn query_similar_orders_by_similarity() {
        let store = InMemoryVectorStore::new();
        let opts = CallOptions::unbounded();
        let records = vec![
            VectorRecord {
                id: "orthogonal".to_string(),
                document: String::new(),
                metadata: Default::default(),
                embedding: vec![0.0, 1.0],
            },
            VectorRecord {
                id: "aligned".to_string(),
                document: String::new(),
                metadata: Default::default(),
                embedding: vec![1.0, 0.0],
            },
        ];
        store
            .store(Collection::Articles, records, &opts)
            .await
            .unwrap();
        let hits = store
            .query_similar(Collection::Articles, &[1.0, 0.0], 10, None, &opts)
            .await
            .unwrap();
        assert_eq!(hits[0].id, "aligned");
        assert!(hits[0].similarity > hits[1].similarity);
    }

    #[tokio::test]
    async fn progress_stream_caps_at_limit() {
        let sink = RecordingProgressSink::new();
        let opts = CallOptions::unbounded();
        for i in 0..(PROGRESS_STREAM_CAP + 10) {
            let update = AgentUpdate::new(
                newsmith_core::UpdateType::AgentUpdate,
                "wf",
                "req",
                "memory",
                newsmith_core::AgentStatus::Processing,
                format!("msg {i}"),
            );
            sink.publish("user", update, &opts).await.unwrap();
        }
        let events = sink.events_for("user");
        assert_eq!(events.len(), PROGRESS_STREAM_CAP);
        assert_eq!(events[0].message, "msg 10");
    }

    #[tokio::test]
    async fn hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::new();
        let opts = CallOptions::unbounded();
        let a = embedder.embed("same text", &opts).await.unwrap();
        let b = embedder.embed("same text", &opts).await.unwrap();
        assert_eq!(a, b);
    }
}
