// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Newsmith pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Newsmith configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NewsmithConfig {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub vector: VectorConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Service identity and logging.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant persona.
    #[serde(default = "default_agent_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "newsmith".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// LLM provider call policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Per-call timeout in seconds.
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts per call, including the first.
    #[serde(default = "default_llm_max_retries")]
    pub max_retries: u32,
    /// Base delay for linear backoff between attempts, in milliseconds.
    #[serde(default = "default_llm_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_llm_timeout_secs(),
            max_retries: default_llm_max_retries(),
            retry_delay_ms: default_llm_retry_delay_ms(),
        }
    }
}

fn default_llm_timeout_secs() -> u64 {
    30
}

fn default_llm_max_retries() -> u32 {
    3
}

fn default_llm_retry_delay_ms() -> u64 {
    2000
}

/// Embedding generation policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Concurrent in-flight embedding requests per set.
    #[serde(default = "default_embedding_concurrency")]
    pub concurrency: usize,
    /// Attempts per item, including the first.
    #[serde(default = "default_embedding_max_retries")]
    pub max_retries: u32,
    /// Base delay for linear backoff between attempts, in milliseconds.
    #[serde(default = "default_embedding_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Per-set timeout in seconds.
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            concurrency: default_embedding_concurrency(),
            max_retries: default_embedding_max_retries(),
            retry_delay_ms: default_embedding_retry_delay_ms(),
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

fn default_embedding_concurrency() -> usize {
    5
}

fn default_embedding_max_retries() -> u32 {
    2
}

fn default_embedding_retry_delay_ms() -> u64 {
    5000
}

fn default_embedding_timeout_secs() -> u64 {
    60
}

/// News and video retrieval policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Page size for keyword news search.
    #[serde(default = "default_news_page_size")]
    pub news_page_size: usize,
    /// Recency window for the fallback news search, in hours.
    #[serde(default = "default_recent_hours")]
    pub recent_hours: u32,
    /// Item cap for the fallback news search.
    #[serde(default = "default_recent_max")]
    pub recent_max: usize,
    /// Maximum accepted videos per workflow.
    #[serde(default = "default_video_max")]
    pub video_max: usize,
    /// Word cap applied to fetched transcripts.
    #[serde(default = "default_transcript_word_cap")]
    pub transcript_word_cap: usize,
    /// Per-task timeout for the retrieval fan-out, in seconds.
    #[serde(default = "default_retrieval_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            news_page_size: default_news_page_size(),
            recent_hours: default_recent_hours(),
            recent_max: default_recent_max(),
            video_max: default_video_max(),
            transcript_word_cap: default_transcript_word_cap(),
            timeout_secs: default_retrieval_timeout_secs(),
        }
    }
}

fn default_news_page_size() -> usize {
    100
}

fn default_recent_hours() -> u32 {
    48
}

fn default_recent_max() -> usize {
    15
}

fn default_video_max() -> usize {
    8
}

fn default_transcript_word_cap() -> usize {
    2500
}

fn default_retrieval_timeout_secs() -> u64 {
    45
}

/// Vector store query policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VectorConfig {
    /// Neighbour count for article similarity queries.
    #[serde(default = "default_article_top_k")]
    pub article_top_k: usize,
    /// Neighbour count for video similarity queries.
    #[serde(default = "default_video_top_k")]
    pub video_top_k: usize,
    /// Per-call timeout in seconds.
    #[serde(default = "default_vector_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            article_top_k: default_article_top_k(),
            video_top_k: default_video_top_k(),
            timeout_secs: default_vector_timeout_secs(),
        }
    }
}

fn default_article_top_k() -> usize {
    20
}

fn default_video_top_k() -> usize {
    10
}

fn default_vector_timeout_secs() -> u64 {
    15
}

/// Scrape enrichment policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScraperConfig {
    /// Concurrent in-flight scrapes.
    #[serde(default = "default_scraper_concurrency")]
    pub concurrency: usize,
    /// Per-URL timeout in seconds.
    #[serde(default = "default_scraper_timeout_secs")]
    pub timeout_secs: u64,
    /// Retry attempts per URL within the batch call.
    #[serde(default = "default_scraper_retries")]
    pub retries: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            concurrency: default_scraper_concurrency(),
            timeout_secs: default_scraper_timeout_secs(),
            retries: default_scraper_retries(),
        }
    }
}

fn default_scraper_concurrency() -> usize {
    5
}

fn default_scraper_timeout_secs() -> u64 {
    30
}

fn default_scraper_retries() -> u32 {
    3
}

/// Workflow lifecycle policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Outer per-request deadline in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Grace period for draining live workflows on shutdown, in seconds.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_shutdown_grace_secs() -> u64 {
    30
}

/// HTTP surface bind address.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}
