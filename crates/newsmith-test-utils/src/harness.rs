// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end test harness.
//!
//! Assembles a full orchestrator over mock ports with fast retry timings,
//! and keeps handles to every mock for scripting and assertions.

use std::sync::Arc;

use newsmith_agents::LlmAgents;
use newsmith_config::NewsmithConfig;
use newsmith_memory::ConversationGateway;
use newsmith_orchestrator::{Orchestrator, Ports};
use newsmith_vector::VectorGateway;

use crate::in_memory::{
    HashEmbedder, InMemoryMemoryStore, InMemoryVectorStore, MockScraper, RecordingProgressSink,
};
use crate::mock_llm::MockTextGenerator;
use crate::mock_search::{MockNewsSearch, MockVideoSearch};

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    config: NewsmithConfig,
    llm_responses: Vec<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = NewsmithConfig::default();
        // Fast-fail timings so fallback paths run in test time.
        config.llm.max_retries = 1;
        config.llm.retry_delay_ms = 1;
        config.embedding.max_retries = 1;
        config.embedding.retry_delay_ms = 1;
        config.workflow.shutdown_grace_secs = 1;
        Self {
            config,
            llm_responses: Vec::new(),
        }
    }

    /// Pre-loads LLM responses, consumed in call order.
    pub fn with_llm_responses(mut self, responses: Vec<String>) -> Self {
        self.llm_responses = responses;
        self
    }

    /// Overrides the configuration.
    pub fn with_config(mut self, config: NewsmithConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> TestHarness {
        let llm = Arc::new(MockTextGenerator::with_responses(self.llm_responses));
        let embedder = Arc::new(HashEmbedder::new());
        let news = Arc::new(MockNewsSearch::new());
        let videos = Arc::new(MockVideoSearch::new());
        let vector_store = Arc::new(InMemoryVectorStore::new());
        let scraper = Arc::new(MockScraper::new());
        let memory_store = Arc::new(InMemoryMemoryStore::new());
        let progress = Arc::new(RecordingProgressSink::new());

        let ports = Ports {
            llm: Arc::new(LlmAgents::new(llm.clone(), self.config.llm.clone())),
            embeddings: embedder.clone(),
            news: news.clone(),
            videos: videos.clone(),
            vectors: Arc::new(VectorGateway::new(vector_store.clone())),
            scraper: scraper.clone(),
            conversations: Arc::new(ConversationGateway::new(memory_store.clone())),
            state_store: memory_store.clone(),
            progress: progress.clone(),
        };

        TestHarness {
            orchestrator: Orchestrator::new(ports, self.config),
            llm,
            embedder,
            news,
            videos,
            vector_store,
            scraper,
            memory_store,
            progress,
        }
    }
}

/// A complete orchestrator over mock ports, with handles for scripting.
pub struct TestHarness {
    pub orchestrator: Orchestrator,
    pub llm: Arc<MockTextGenerator>,
    pub embedder: Arc<HashEmbedder>,
    pub news: Arc<MockNewsSearch>,
    pub videos: Arc<MockVideoSearch>,
    pub vector_store: Arc<InMemoryVectorStore>,
    pub scraper: Arc<MockScraper>,
    pub memory_store: Arc<InMemoryMemoryStore>,
    pub progress: Arc<RecordingProgressSink>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn harness_runs_a_chitchat_workflow() {
        let harness = TestHarness::builder()
            .with_llm_responses(vec![
                fixtures::classification_json("chitchat", 0.9),
                "Hello there!".to_string(),
            ])
            .build();

        let response = harness
            .orchestrator
            .execute(fixtures::request("user-1", "hi"))
            .await;
        assert_eq!(response.status, "completed");
        assert_eq!(response.message, "Hello there!");
    }
}
