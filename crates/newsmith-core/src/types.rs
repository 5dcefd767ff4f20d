// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model shared across the Newsmith pipeline.
//!
//! The [`WorkflowContext`] is the per-request aggregate: created at
//! submission, mutated only by the owning workflow executor, sealed on
//! completion. The embedded [`ConversationContext`] is the per-user
//! dialogue state that survives across workflows; its exchange list is the
//! source of truth and the `last_*` fields are derived on append.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Capacity of the rolling topic window on a conversation.
pub const MAX_CURRENT_TOPICS: usize = 10;

/// Capacity of the rolling keyword window on a conversation.
pub const MAX_RECENT_KEYWORDS: usize = 20;

/// Lifecycle status of a workflow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Timeout,
}

impl WorkflowStatus {
    /// Terminal statuses are the only ones allowed to carry an end time.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkflowStatus::Completed
                | WorkflowStatus::Failed
                | WorkflowStatus::Cancelled
                | WorkflowStatus::Timeout
        )
    }
}

/// Classified intent of a user query.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    NewNewsQuery,
    FollowUpDiscussion,
    Chitchat,
}

/// Per-user presentation preferences carried on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Personality tag selecting the stylization voice.
    #[serde(default)]
    pub news_personality: String,
    /// Topics the user has opted into.
    #[serde(default)]
    pub favourite_topics: Vec<String>,
    /// Preferred response length ("concise", "detailed", ...).
    #[serde(default = "default_response_length")]
    pub response_length: String,
}

fn default_response_length() -> String {
    "concise".to_string()
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            news_personality: String::new(),
            favourite_topics: Vec::new(),
            response_length: default_response_length(),
        }
    }
}

/// A news article candidate flowing through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    /// Deterministic id derived from the URL; see [`NewsArticle::id_for_url`].
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: String,
    /// Full body text; may be filled in lazily by scrape enrichment.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category: String,
    /// LLM-judged relevance in [0, 1]; absent until the ranker has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f32>,
}

impl NewsArticle {
    /// Stable article id: FNV-1a over the URL, rendered as hex.
    ///
    /// `id_for_url(a) == id_for_url(b)` iff `a == b`.
    pub fn id_for_url(url: &str) -> String {
        const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
        let mut hash = FNV_OFFSET;
        for byte in url.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        format!("article_{hash:016x}")
    }

    /// Articles with an empty title or URL never enter the context.
    pub fn is_well_formed(&self) -> bool {
        !self.title.trim().is_empty() && !self.url.trim().is_empty()
    }
}

/// A video candidate flowing through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Caption-derived transcript or an LLM fallback summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u64>,
    /// ISO-8601 duration string as reported by the provider (e.g. `PT5M30S`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// LLM-judged relevance in [0, 1]; absent until the ranker has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevancy_score: Option<f32>,
}

impl Video {
    pub fn is_well_formed(&self) -> bool {
        !self.title.trim().is_empty() && !self.url.trim().is_empty()
    }

    /// True when the video carries a substantive transcript.
    pub fn has_transcript(&self) -> bool {
        self.transcript
            .as_deref()
            .is_some_and(|t| t.trim().len() > 100)
    }
}

/// One committed (user query, assistant response) pair. Immutable once
/// appended to a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationExchange {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub user_query: String,
    pub assistant_response: String,
    pub intent: Intent,
    #[serde(default)]
    pub key_topics: Vec<String>,
    #[serde(default)]
    pub key_entities: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// End-to-end processing time of the workflow that produced this exchange.
    #[serde(default)]
    pub processing_ms: u64,
}

/// Per-user persistent dialogue state. Lives 7 days past last activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub user_id: String,
    /// Append-only within a session; the source of truth for all `last_*` fields.
    #[serde(default)]
    pub exchanges: Vec<ConversationExchange>,
    #[serde(default)]
    pub total_exchanges: usize,
    /// Rolling topic window, capacity [`MAX_CURRENT_TOPICS`], least-recent evicted.
    #[serde(default)]
    pub current_topics: Vec<String>,
    /// Rolling keyword window, capacity [`MAX_RECENT_KEYWORDS`], least-recent evicted.
    #[serde(default)]
    pub recent_keywords: Vec<String>,
    #[serde(default)]
    pub last_query: String,
    #[serde(default)]
    pub last_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_intent: Option<Intent>,
    #[serde(default)]
    pub last_referenced_topic: String,
    #[serde(default)]
    pub last_summary: String,
    /// Brief running summary of the conversation so far.
    #[serde(default)]
    pub context_summary: String,
    pub session_start: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    #[serde(default)]
    pub message_count: usize,
    #[serde(default)]
    pub user_preferences: UserPreferences,
    pub updated_at: DateTime<Utc>,
}

impl ConversationContext {
    /// Fresh context for a user's first turn.
    pub fn new(user_id: impl Into<String>, preferences: UserPreferences) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            exchanges: Vec::new(),
            total_exchanges: 0,
            current_topics: Vec::new(),
            recent_keywords: Vec::new(),
            last_query: String::new(),
            last_response: String::new(),
            last_intent: None,
            last_referenced_topic: String::new(),
            last_summary: String::new(),
            context_summary: String::new(),
            session_start: now,
            last_active: now,
            message_count: 0,
            user_preferences: preferences,
            updated_at: now,
        }
    }

    /// Appends an exchange and refreshes the derived tracking fields.
    #[allow(clippy::too_many_arguments)]
    pub fn add_exchange(
        &mut self,
        user_query: &str,
        assistant_response: &str,
        intent: Intent,
        topics: &[String],
        entities: &[String],
        keywords: &[String],
        processing_ms: u64,
    ) {
        let now = Utc::now();
        self.exchanges.push(ConversationExchange {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: now,
            user_query: user_query.to_string(),
            assistant_response: assistant_response.to_string(),
            intent,
            key_topics: topics.to_vec(),
            key_entities: entities.to_vec(),
            keywords: keywords.to_vec(),
            processing_ms,
        });
        self.total_exchanges += 1;
        self.message_count += 1;
        self.current_topics = merge_and_limit(&self.current_topics, topics, MAX_CURRENT_TOPICS);
        self.recent_keywords =
            merge_and_limit(&self.recent_keywords, keywords, MAX_RECENT_KEYWORDS);
        self.last_query = user_query.to_string();
        self.last_response = assistant_response.to_string();
        self.last_intent = Some(intent);
        self.last_active = now;
        self.updated_at = now;
    }

    /// The most recent `count` exchanges, oldest first.
    pub fn recent_exchanges(&self, count: usize) -> &[ConversationExchange] {
        let start = self.exchanges.len().saturating_sub(count);
        &self.exchanges[start..]
    }

    /// Exchanges relevant to a follow-up query. Currently the recency
    /// window; the query parameter is kept for a semantic upgrade.
    pub fn find_relevant_exchanges(
        &self,
        _query: &str,
        max_count: usize,
    ) -> &[ConversationExchange] {
        self.recent_exchanges(max_count)
    }

    pub fn has_previous_exchanges(&self) -> bool {
        !self.exchanges.is_empty()
    }

    pub fn last_exchange(&self) -> Option<&ConversationExchange> {
        self.exchanges.last()
    }
}

/// Merges `additions` into `existing` preserving first-seen order and
/// de-duplicating, then keeps only the `limit` most recent entries.
pub fn merge_and_limit(existing: &[String], additions: &[String], limit: usize) -> Vec<String> {
    let mut result: Vec<String> = existing.to_vec();
    for item in additions {
        if !result.iter().any(|e| e == item) {
            result.push(item.clone());
        }
    }
    if result.len() > limit {
        result.drain(..result.len() - limit);
    }
    result
}

/// Per-stage execution record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageStats {
    pub name: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Aggregate counters for a single workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    #[serde(default)]
    pub total_duration_ms: u64,
    #[serde(default)]
    pub stage_stats: BTreeMap<String, StageStats>,
    #[serde(default)]
    pub articles_found: usize,
    #[serde(default)]
    pub videos_found: usize,
    #[serde(default)]
    pub articles_filtered: usize,
    #[serde(default)]
    pub videos_filtered: usize,
    #[serde(default)]
    pub articles_summarized: usize,
    #[serde(default)]
    pub videos_summarized: usize,
    #[serde(default)]
    pub api_calls: usize,
    #[serde(default)]
    pub embeddings_count: usize,
    #[serde(default)]
    pub cache_hits: usize,
}

/// Fan-out intermediates handed between stages. Written only at joins by
/// the owning executor; child tasks return results instead of mutating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageArtifacts {
    #[serde(default)]
    pub fresh_articles: Vec<NewsArticle>,
    #[serde(default)]
    pub fresh_videos: Vec<Video>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub article_embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    pub video_embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    pub semantic_articles: Vec<NewsArticle>,
    #[serde(default)]
    pub semantic_videos: Vec<Video>,
    #[serde(default)]
    pub stored_articles: usize,
    #[serde(default)]
    pub stored_videos: usize,
}

/// Submission payload for one workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRequest {
    pub user_id: String,
    pub query: String,
    /// Client-provided id; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub user_preferences: UserPreferences,
}

/// Terminal summary returned to the submitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResponse {
    pub workflow_id: String,
    pub request_id: String,
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Total elapsed time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time_ms: Option<u64>,
}

impl WorkflowResponse {
    pub fn new(
        workflow_id: impl Into<String>,
        request_id: impl Into<String>,
        status: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            request_id: request_id.into(),
            status: status.into(),
            message: message.into(),
            timestamp: Utc::now(),
            total_time_ms: None,
        }
    }
}

/// The per-request aggregate. Exclusively owned by its workflow executor;
/// the live registry holds only a snapshot handle keyed by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowContext {
    pub id: String,
    pub user_id: String,
    pub request_id: String,
    /// Immutable original query.
    pub original_query: String,
    /// Set at most once by the query enhancer or the classifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_query: Option<String>,
    pub status: WorkflowStatus,
    pub start_time: DateTime<Utc>,
    /// Present iff status is terminal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(default)]
    pub intent_confidence: f32,
    /// Ordered, de-duplicated search keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub articles: Vec<NewsArticle>,
    #[serde(default)]
    pub videos: Vec<Video>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub conversation: ConversationContext,
    #[serde(default)]
    pub is_follow_up: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_exchange_id: Option<String>,
    #[serde(default)]
    pub referenced_topic: String,
    #[serde(default)]
    pub processing_stats: ProcessingStats,
    #[serde(default)]
    pub artifacts: StageArtifacts,
    /// Free-form bag for small stage outputs (counts, flags).
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl WorkflowContext {
    pub fn new(request: &WorkflowRequest, request_id: impl Into<String>) -> Self {
        let workflow_id = request
            .workflow_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Self {
            id: workflow_id,
            user_id: request.user_id.clone(),
            request_id: request_id.into(),
            original_query: request.query.clone(),
            enhanced_query: None,
            status: WorkflowStatus::Pending,
            start_time: Utc::now(),
            end_time: None,
            intent: None,
            intent_confidence: 0.0,
            keywords: Vec::new(),
            articles: Vec::new(),
            videos: Vec::new(),
            summary: None,
            response: None,
            conversation: ConversationContext::new(
                request.user_id.clone(),
                request.user_preferences.clone(),
            ),
            is_follow_up: false,
            referenced_exchange_id: None,
            referenced_topic: String::new(),
            processing_stats: ProcessingStats::default(),
            artifacts: StageArtifacts::default(),
            metadata: BTreeMap::new(),
        }
    }

    fn seal(&mut self, status: WorkflowStatus) {
        debug_assert!(status.is_terminal());
        self.status = status;
        let now = Utc::now();
        self.end_time = Some(now);
        self.processing_stats.total_duration_ms =
            (now - self.start_time).num_milliseconds().max(0) as u64;
    }

    pub fn mark_processing(&mut self) {
        self.status = WorkflowStatus::Processing;
    }

    pub fn mark_completed(&mut self) {
        self.seal(WorkflowStatus::Completed);
    }

    pub fn mark_failed(&mut self) {
        self.seal(WorkflowStatus::Failed);
    }

    pub fn mark_timeout(&mut self) {
        self.seal(WorkflowStatus::Timeout);
    }

    /// Records follow-up classification output. The referenced topic is
    /// required to be non-empty whenever the flag is set.
    pub fn mark_as_follow_up(&mut self, referenced_topic: &str, referenced_exchange_id: &str) {
        self.is_follow_up = true;
        self.referenced_topic = referenced_topic.to_string();
        if !referenced_exchange_id.is_empty() {
            self.referenced_exchange_id = Some(referenced_exchange_id.to_string());
        }
        self.conversation.last_referenced_topic = referenced_topic.to_string();
    }

    /// Adds keywords preserving insertion order and dropping duplicates.
    pub fn add_keywords(&mut self, keywords: &[String]) {
        for keyword in keywords {
            if !self.keywords.iter().any(|k| k == keyword) {
                self.keywords.push(keyword.clone());
            }
        }
    }

    pub fn set_intent(&mut self, intent: Intent, confidence: f32) {
        self.intent = Some(intent);
        self.intent_confidence = confidence.clamp(0.0, 1.0);
        self.conversation.last_intent = Some(intent);
    }

    pub fn set_enhanced_query(&mut self, enhanced: impl Into<String>) {
        self.enhanced_query = Some(enhanced.into());
    }

    /// The query retrieval and embedding should run against.
    pub fn effective_query(&self) -> &str {
        self.enhanced_query
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .unwrap_or(&self.original_query)
    }

    pub fn record_stage(&mut self, stats: StageStats) {
        self.processing_stats
            .stage_stats
            .insert(stats.name.clone(), stats);
    }

    pub fn duration(&self) -> Duration {
        let end = self.end_time.unwrap_or_else(Utc::now);
        Duration::from_millis((end - self.start_time).num_milliseconds().max(0) as u64)
    }

    pub fn is_completed(&self) -> bool {
        self.status == WorkflowStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status == WorkflowStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> WorkflowRequest {
        WorkflowRequest {
            user_id: "user-1".to_string(),
            query: "Why are US gas prices rising?".to_string(),
            workflow_id: None,
            user_preferences: UserPreferences::default(),
        }
    }

    #[test]
    fn article_id_is_stable_per_url() {
        let a = NewsArticle::id_for_url("https://example.com/story");
        let b = NewsArticle::id_for_url("https://example.com/story");
        let c = NewsArticle::id_for_url("https://example.com/other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("article_"));
    }

    #[test]
    fn workflow_context_generates_id_when_absent() {
        let ctx = WorkflowContext::new(&request(), "req-1");
        assert!(!ctx.id.is_empty());
        assert_eq!(ctx.status, WorkflowStatus::Pending);
        assert!(ctx.end_time.is_none());
    }

    #[test]
    fn workflow_context_keeps_client_id() {
        let mut req = request();
        req.workflow_id = Some("wf-client".to_string());
        let ctx = WorkflowContext::new(&req, "req-1");
        assert_eq!(ctx.id, "wf-client");
    }

    #[test]
    fn sealing_sets_end_time_and_duration() {
        let mut ctx = WorkflowContext::new(&request(), "req-1");
        ctx.mark_completed();
        assert!(ctx.status.is_terminal());
        let end = ctx.end_time.expect("sealed workflow must carry end time");
        assert!(end >= ctx.start_time);
        let delta = (end - ctx.start_time).num_milliseconds().max(0) as u64;
        assert!(ctx.processing_stats.total_duration_ms.abs_diff(delta) <= 1);
    }

    #[test]
    fn add_keywords_preserves_order_and_dedups() {
        let mut ctx = WorkflowContext::new(&request(), "req-1");
        ctx.add_keywords(&["gas".into(), "prices".into()]);
        ctx.add_keywords(&["prices".into(), "inflation".into()]);
        assert_eq!(ctx.keywords, vec!["gas", "prices", "inflation"]);
    }

    #[test]
    fn follow_up_marking_requires_topic_propagation() {
        let mut ctx = WorkflowContext::new(&request(), "req-1");
        ctx.mark_as_follow_up("Tesla Q3 earnings", "ex-1");
        assert!(ctx.is_follow_up);
        assert_eq!(ctx.referenced_topic, "Tesla Q3 earnings");
        assert_eq!(ctx.referenced_exchange_id.as_deref(), Some("ex-1"));
        assert_eq!(ctx.conversation.last_referenced_topic, "Tesla Q3 earnings");
    }

    #[test]
    fn effective_query_prefers_enhanced() {
        let mut ctx = WorkflowContext::new(&request(), "req-1");
        assert_eq!(ctx.effective_query(), "Why are US gas prices rising?");
        ctx.set_enhanced_query("gas prices inflation");
        assert_eq!(ctx.effective_query(), "gas prices inflation");
    }

    #[test]
    fn effective_query_ignores_blank_enhancement() {
        let mut ctx = WorkflowContext::new(&request(), "req-1");
        ctx.set_enhanced_query("  ");
        assert_eq!(ctx.effective_query(), "Why are US gas prices rising?");
    }

    #[test]
    fn add_exchange_refreshes_derived_fields() {
        let mut cc = ConversationContext::new("user-1", UserPreferences::default());
        cc.add_exchange(
            "what about tesla?",
            "Tesla reported...",
            Intent::NewNewsQuery,
            &["Tesla Q3 earnings".into()],
            &[],
            &["tesla".into(), "earnings".into()],
            1200,
        );
        assert_eq!(cc.total_exchanges, 1);
        assert_eq!(cc.message_count, 1);
        assert_eq!(cc.last_query, "what about tesla?");
        assert_eq!(cc.last_response, "Tesla reported...");
        assert_eq!(cc.last_intent, Some(Intent::NewNewsQuery));
        assert_eq!(cc.current_topics, vec!["Tesla Q3 earnings"]);
        assert_eq!(cc.recent_keywords, vec!["tesla", "earnings"]);
    }

    #[test]
    fn merge_and_limit_evicts_least_recent() {
        let existing: Vec<String> = (0..10).map(|i| format!("t{i}")).collect();
        let merged = merge_and_limit(&existing, &["t10".into()], MAX_CURRENT_TOPICS);
        assert_eq!(merged.len(), MAX_CURRENT_TOPICS);
        assert_eq!(merged.first().map(String::as_str), Some("t1"));
        assert_eq!(merged.last().map(String::as_str), Some("t10"));
    }

    #[test]
    fn merge_and_limit_skips_duplicates() {
        let merged = merge_and_limit(&["a".into(), "b".into()], &["b".into(), "c".into()], 20);
        assert_eq!(merged, vec!["a", "b", "c"]);
    }

    #[test]
    fn recent_keywords_capacity_holds() {
        let mut cc = ConversationContext::new("u", UserPreferences::default());
        for batch in 0..5 {
            let kws: Vec<String> = (0..6).map(|i| format!("k{batch}-{i}")).collect();
            cc.add_exchange("q", "r", Intent::Chitchat, &[], &[], &kws, 0);
        }
        assert!(cc.recent_keywords.len() <= MAX_RECENT_KEYWORDS);
        assert!(cc.current_topics.len() <= MAX_CURRENT_TOPICS);
    }

    #[test]
    fn recent_exchanges_returns_tail() {
        let mut cc = ConversationContext::new("u", UserPreferences::default());
        for i in 0..5 {
            cc.add_exchange(&format!("q{i}"), "r", Intent::Chitchat, &[], &[], &[], 0);
        }
        let recent = cc.recent_exchanges(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].user_query, "q2");
        assert_eq!(recent[2].user_query, "q4");
    }

    #[test]
    fn well_formed_rejects_empty_title_or_url() {
        let article = NewsArticle {
            id: "a".into(),
            title: "  ".into(),
            url: "https://x".into(),
            source: "s".into(),
            author: None,
            published_at: None,
            description: String::new(),
            content: String::new(),
            image_url: String::new(),
            category: String::new(),
            relevance_score: None,
        };
        assert!(!article.is_well_formed());
    }

    #[test]
    fn intent_serializes_snake_case() {
        let json = serde_json::to_string(&Intent::NewNewsQuery).unwrap();
        assert_eq!(json, "\"new_news_query\"");
        let back: Intent = serde_json::from_str("\"follow_up_discussion\"").unwrap();
        assert_eq!(back, Intent::FollowUpDiscussion);
    }
}
