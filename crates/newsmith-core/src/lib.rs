// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core types, error taxonomy, and capability traits for the Newsmith
//! conversational news pipeline.
//!
//! Everything an external collaborator needs to implement lives under
//! [`traits`]; everything the pipeline passes between stages lives under
//! [`types`] and [`update`].

pub mod error;
pub mod stage;
pub mod traits;
pub mod types;
pub mod update;

pub use error::{ErrorKind, NewsmithError};
pub use stage::{default_agent_configs, AgentConfig};
pub use traits::{
    CallOptions, Collection, EmbeddingProvider, Filter, GenerationRequest, GenerationResponse,
    MemoryStore, NewsSearch, ProgressSink, ScrapeOutcome, ScrapedPage, Scraper, SimilarityHit,
    TextGenerator, VectorRecord, VectorStore, VideoSearch,
};
pub use types::{
    ConversationContext, ConversationExchange, Intent, NewsArticle, ProcessingStats,
    StageArtifacts, StageStats, UserPreferences, Video, WorkflowContext, WorkflowRequest,
    WorkflowResponse, WorkflowStatus,
};
pub use update::{AgentStatus, AgentUpdate, UpdateType, PROGRESS_STREAM_CAP};
