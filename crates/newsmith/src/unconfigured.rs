// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Placeholder adapters for ports without a configured integration.
//!
//! The daemon boots with these so the HTTP surface, health endpoint, and
//! progress stream are exercisable before real provider adapters are
//! wired in; any workflow touching an unconfigured port fails with an
//! `unavailable` error naming the missing integration.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use newsmith_core::{
    CallOptions, Collection, ConversationContext, EmbeddingProvider, Filter, GenerationRequest,
    GenerationResponse, MemoryStore, NewsArticle, NewsSearch, NewsmithError, ScrapeOutcome,
    ScrapedPage, Scraper, SimilarityHit, TextGenerator, VectorRecord, VectorStore, Video,
    VideoSearch, WorkflowContext,
};

fn unconfigured(integration: &str) -> NewsmithError {
    NewsmithError::unavailable(
        "INTEGRATION_UNCONFIGURED",
        format!("no {integration} integration is configured"),
    )
}

/// Stands in for every external provider port.
pub struct Unconfigured;

#[async_trait]
impl TextGenerator for Unconfigured {
    async fn generate(
        &self,
        _request: GenerationRequest,
        _opts: &CallOptions,
    ) -> Result<GenerationResponse, NewsmithError> {
        Err(unconfigured("LLM provider"))
    }
}

#[async_trait]
impl EmbeddingProvider for Unconfigured {
    async fn embed(&self, _text: &str, _opts: &CallOptions) -> Result<Vec<f32>, NewsmithError> {
        Err(unconfigured("embedding provider"))
    }
}

#[async_trait]
impl NewsSearch for Unconfigured {
    async fn search_keywords(
        &self,
        _keywords: &[String],
        _max_results: usize,
        _opts: &CallOptions,
    ) -> Result<Vec<NewsArticle>, NewsmithError> {
        Err(unconfigured("news search"))
    }

    async fn search_recent(
        &self,
        _query: &str,
        _hours_back: u32,
        _max_results: usize,
        _opts: &CallOptions,
    ) -> Result<Vec<NewsArticle>, NewsmithError> {
        Err(unconfigured("news search"))
    }
}

#[async_trait]
impl VideoSearch for Unconfigured {
    async fn search_keywords(
        &self,
        _keywords: &[String],
        _max_results: usize,
        _opts: &CallOptions,
    ) -> Result<Vec<Video>, NewsmithError> {
        Err(unconfigured("video search"))
    }

    async fn search_query(
        &self,
        _query: &str,
        _max_results: usize,
        _opts: &CallOptions,
    ) -> Result<Vec<Video>, NewsmithError> {
        Err(unconfigured("video search"))
    }

    async fn get_transcript(
        &self,
        _video_id: &str,
        _opts: &CallOptions,
    ) -> Result<String, NewsmithError> {
        Err(unconfigured("video search"))
    }
}

#[async_trait]
impl Scraper for Unconfigured {
    async fn scrape(
        &self,
        _url: &str,
        _deadline: Duration,
        _opts: &CallOptions,
    ) -> Result<ScrapedPage, NewsmithError> {
        Err(unconfigured("scraper"))
    }

    async fn scrape_many(
        &self,
        _urls: &[String],
        _concurrency: usize,
        _per_url_timeout: Duration,
        _retries: u32,
        _opts: &CallOptions,
    ) -> Result<ScrapeOutcome, NewsmithError> {
        Err(unconfigured("scraper"))
    }
}

#[async_trait]
impl VectorStore for Unconfigured {
    async fn store(
        &self,
        _collection: Collection,
        _records: Vec<VectorRecord>,
        _opts: &CallOptions,
    ) -> Result<(), NewsmithError> {
        Err(unconfigured("vector store"))
    }

    async fn query_similar(
        &self,
        _collection: Collection,
        _embedding: &[f32],
        _top_k: usize,
        _filter: Option<&Filter>,
        _opts: &CallOptions,
    ) -> Result<Vec<SimilarityHit>, NewsmithError> {
        Err(unconfigured("vector store"))
    }

    async fn delete(
        &self,
        _collection: Collection,
        _ids: &[String],
        _opts: &CallOptions,
    ) -> Result<(), NewsmithError> {
        Err(unconfigured("vector store"))
    }
}

/// Process-local memory store used until an external backend is wired.
/// State does not survive a restart.
#[derive(Default)]
pub struct LocalMemoryStore {
    conversations: Mutex<HashMap<String, ConversationContext>>,
    workflow_states: Mutex<HashMap<String, WorkflowContext>>,
}

impl LocalMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for LocalMemoryStore {
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
