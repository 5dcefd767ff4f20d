// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-workflow executor.
//!
//! One executor exclusively owns its [`WorkflowContext`] for the duration
//! of the run. Child tasks spawned at fan-out points return their results
//! to the executor, which merges them at the join; the registry snapshot is
//! refreshed at stage boundaries so status queries never race the run.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use newsmith_agents::{IntentClassification, LlmAgents};
use newsmith_core::stage::AgentConfig;
use newsmith_core::{
    AgentStatus, CallOptions, EmbeddingProvider, Intent, MemoryStore, NewsSearch, NewsmithError,
    ProgressSink, Scraper, StageStats, VideoSearch, WorkflowContext,
};
use newsmith_config::NewsmithConfig;
use newsmith_memory::ConversationGateway;
use newsmith_vector::VectorGateway;
use tracing::warn;

use crate::progress::ProgressEmitter;
use crate::registry::WorkflowSnapshot;

/// Deadline for stages missing from the policy table.
const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// The collaborator ports a workflow needs.
pub struct Ports {
    pub llm: Arc<LlmAgents>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub news: Arc<dyn NewsSearch>,
    pub videos: Arc<dyn VideoSearch>,
    pub vectors: Arc<VectorGateway>,
    pub scraper: Arc<dyn Scraper>,
    pub conversations: Arc<ConversationGateway>,
    pub state_store: Arc<dyn MemoryStore>,
    pub progress: Arc<dyn ProgressSink>,
}

pub(crate) struct WorkflowExecutor {
    pub(crate) ports: Arc<Ports>,
    pub(crate) config: NewsmithConfig,
    pub(crate) emitter: ProgressEmitter,
    pub(crate) opts: CallOptions,
    stage_configs: Arc<BTreeMap<String, AgentConfig>>,
    snapshot: WorkflowSnapshot,
}

/// Timing handle for one stage execution.
pub(crate) struct StageTimer {
    name: &'static str,
    started_at: chrono::DateTime<Utc>,
    start: Instant,
}

impl StageTimer {
    pub(crate) fn start(name: &'static str) -> Self {
        Self {
            name,
            started_at: Utc::now(),
            start: Instant::now(),
        }
    }

    pub(crate) fn finish(self, context: &mut WorkflowContext, status: AgentStatus) {
        context.record_stage(StageStats {
            name: self.name.to_string(),
            status: status.to_string(),
            started_at: self.started_at,
            ended_at: Utc::now(),
            duration_ms: self.start.elapsed().as_millis() as u64,
        });
    }
}

impl WorkflowExecutor {
    pub(crate) fn new(
        ports: Arc<Ports>,
        config: NewsmithConfig,
        emitter: ProgressEmitter,
        opts: CallOptions,
        stage_configs: Arc<BTreeMap<String, AgentConfig>>,
        snapshot: WorkflowSnapshot,
    ) -> Self {
        Self {
            ports,
            config,
            emitter,
            opts,
            stage_configs,
            snapshot,
        }
    }

    /// Call options for one stage: same cancellation token, deadline set
    /// to the stage's configured timeout capped by the remaining request
    /// budget.
    pub(crate) fn stage_opts(&self, stage: &str) -> CallOptions {
        let timeout = self
            .stage_configs
            .get(stage)
            .map(|config| config.timeout)
            .unwrap_or(DEFAULT_STAGE_TIMEOUT);
        CallOptions::new(
            self.opts.cancel.clone(),
            Some(Instant::now() + self.opts.stage_budget(timeout)),
        )
    }

    /// Runs the conversational pipeline: memory, classification, then the
    /// branch the intent selects.
    pub(crate) async fn run(&self, context: &mut WorkflowContext) -> Result<(), NewsmithError> {
        context.mark_processing();
        self.sync_snapshot(context);

        self.memory_stage(context).await?;
        let classification = self.classifier_stage(context).await?;
        self.sync_snapshot(context);

        match context.intent {
            Some(Intent::NewNewsQuery) => self.run_news_branch(context, &classification).await,
            Some(Intent::FollowUpDiscussion) => {
                self.follow_up_stage(context, &classification).await
            }
            Some(Intent::Chitchat) | None => self.chitchat_stage(context).await,
        }
    }

    /// Memory stage: loads the conversation context. Non-fatal; a gateway
    /// read error already yields an empty context inside the gateway.
    async fn memory_stage(&self, context: &mut WorkflowContext) -> Result<(), NewsmithError> {
        self.check_cancelled(context)?;
        let timer = StageTimer::start("memory");
        self.emitter
            .stage(
                context,
                "memory",
                AgentStatus::Processing,
                "Loading conversation context",
                &self.opts,
            )
            .await;

        let preferences = context.conversation.user_preferences.clone();
        let stage_opts = self.stage_opts("memory");
        let conversation = self
            .ports
            .conversations
            .load_or_init(&context.user_id, &preferences, &stage_opts)
            .await;

        let message = format!(
            "Loaded context: {} exchanges, {} topics",
            conversation.exchanges.len(),
            conversation.current_topics.len()
        );
        context.conversation = conversation;

        timer.finish(context, AgentStatus::Completed);
        self.emitter
            .stage(context, "memory", AgentStatus::Completed, message, &self.opts)
            .await;
        Ok(())
    }

    /// Classifier stage with the three-step fallback chain: context-aware
    /// classification, then simple two-way classification, then chitchat
    /// at zero confidence.
    async fn classifier_stage(
        &self,
        context: &mut WorkflowContext,
    ) -> Result<IntentClassification, NewsmithError> {
        self.check_cancelled(context)?;
        let timer = StageTimer::start("classifier");
        self.emitter
            .stage(
                context,
                "classifier",
                AgentStatus::Processing,
                "Analyzing intent with conversation context",
                &self.opts,
            )
            .await;

        let history = context.conversation.recent_exchanges(3).to_vec();
        let stage_opts = self.stage_opts("classifier");
        let mut classification = match self
            .ports
            .llm
            .classify_intent(&context.original_query, &history, &stage_opts)
            .await
        {
            Ok(classification) => classification,
            Err(err) if err.is_cancellation() => return Err(err),
            Err(err) => {
                warn!(workflow_id = context.id.as_str(), error = %err, "enhanced intent classification failed, falling back");
                match self
                    .ports
                    .llm
                    .classify_intent_simple(
                        &context.original_query,
                        &context.conversation,
                        &stage_opts,
                    )
                    .await
                {
                    Ok((intent, confidence)) => IntentClassification {
                        intent,
                        confidence,
                        reasoning: "fallback classification used".to_string(),
                        enhanced_query: None,
                        referenced_topic: None,
                        referenced_exchange_id: None,
                    },
                    Err(err) if err.is_cancellation() => return Err(err),
                    Err(err) => {
                        warn!(workflow_id = context.id.as_str(), error = %err, "fallback intent classification also failed");
                        IntentClassification::chitchat_fallback("all classification paths failed")
                    }
                }
            }
        };

        // A follow-up needs something to follow up on.
        if classification.intent == Intent::FollowUpDiscussion
            && !context.conversation.has_previous_exchanges()
        {
            classification.intent = Intent::Chitchat;
            classification.referenced_topic = None;
        }

        context.set_intent(classification.intent, classification.confidence);
        context.processing_stats.api_calls += 1;

        if classification.intent == Intent::FollowUpDiscussion {
            let topic = classification
                .referenced_topic
                .clone()
                .or_else(|| {
                    context
                        .conversation
                        .last_exchange()
                        .and_then(|ex| ex.key_topics.first().cloned())
                })
                .unwrap_or_else(|| context.conversation.last_query.clone());
            let exchange_id = classification
                .referenced_exchange_id
                .clone()
                .or_else(|| context.conversation.last_exchange().map(|ex| ex.id.clone()))
                .unwrap_or_default();
            context.mark_as_follow_up(&topic, &exchange_id);
        }

        if let Some(enhanced) = &classification.enhanced_query {
            context.set_enhanced_query(enhanced.clone());
        }

        let message = format!(
            "Intent: {} (confidence: {:.2}) - {}",
            classification.intent, classification.confidence, classification.reasoning
        );
        timer.finish(context, AgentStatus::Completed);
        self.emitter
            .stage(
                context,
                "classifier",
                AgentStatus::Completed,
                message,
                &self.opts,
            )
            .await;
        Ok(classification)
    }

    /// Follow-up branch: a contextual reply grounded in the referenced
    /// topic and recent exchanges. No retrieval runs here.
    async fn follow_up_stage(
        &self,
        context: &mut WorkflowContext,
        classification: &IntentClassification,
    ) -> Result<(), NewsmithError> {
        self.check_cancelled(context)?;
        let timer = StageTimer::start("chitchat");
        self.emitter
            .stage(
                context,
                "chitchat",
                AgentStatus::Processing,
                "Generating contextual follow-up response",
                &self.opts,
            )
            .await;

        let relevant = context
            .conversation
            .find_relevant_exchanges(&context.original_query, 3)
            .to_vec();
        let referenced_topic = classification
            .referenced_topic
            .clone()
            .unwrap_or_else(|| context.referenced_topic.clone());

        let stage_opts = self.stage_opts("chitchat");
        let result = self
            .ports
            .llm
            .contextual_reply(
                &context.original_query,
                &relevant,
                &referenced_topic,
                &context.conversation.user_preferences,
                &context.conversation.last_summary,
                &stage_opts,
            )
            .await;

        match result {
            Ok(response) => {
                context.processing_stats.api_calls += 1;
                let message = format!(
                    "Generated contextual response ({} chars) referencing: {}",
                    response.len(),
                    referenced_topic
                );
                context.response = Some(response);
                timer.finish(context, AgentStatus::Completed);
                self.emitter
                    .stage(
                        context,
                        "chitchat",
                        AgentStatus::Completed,
                        message,
                        &self.opts,
                    )
                    .await;
                Ok(())
            }
            Err(err) => {
                timer.finish(context, AgentStatus::Failed);
                self.emitter
                    .stage(
                        context,
                        "chitchat",
                        AgentStatus::Failed,
                        "Contextual response generation failed",
                        &self.opts,
                    )
                    .await;
                Err(err)
            }
        }
    }

    /// Chitchat branch: an open-domain reply over the history window.
    async fn chitchat_stage(&self, context: &mut WorkflowContext) -> Result<(), NewsmithError> {
        self.check_cancelled(context)?;
        let timer = StageTimer::start("chitchat");
        self.emitter
            .stage(
                context,
                "chitchat",
                AgentStatus::Processing,
                "Generating conversational response",
                &self.opts,
            )
            .await;

        let stage_opts = self.stage_opts("chitchat");
        let result = self
            .ports
            .llm
            .chitchat_reply(&context.original_query, &context.conversation, &stage_opts)
            .await;

        match result {
            Ok(response) => {
                context.processing_stats.api_calls += 1;
                let message = format!("Generated conversational response ({} chars)", response.len());
                context.response = Some(response);
                timer.finish(context, AgentStatus::Completed);
                self.emitter
                    .stage(
                        context,
                        "chitchat",
                        AgentStatus::Completed,
                        message,
                        &self.opts,
                    )
                    .await;
                Ok(())
            }
            Err(err) => {
                timer.finish(context, AgentStatus::Failed);
                self.emitter
                    .stage(
                        context,
                        "chitchat",
                        AgentStatus::Failed,
                        "Chitchat generation failed",
                        &self.opts,
                    )
                    .await;
                Err(err)
            }
        }
    }

    /// Returns the cancellation error when the workflow's token has fired.
    pub(crate) fn check_cancelled(&self, context: &WorkflowContext) -> Result<(), NewsmithError> {
        if self.opts.is_cancelled() {
            Err(NewsmithError::cancelled(&context.id))
        } else {
            Ok(())
        }
    }

    /// Refreshes the registry snapshot with the current context.
    pub(crate) fn sync_snapshot(&self, context: &WorkflowContext) {
        if let Ok(mut snapshot) = self.snapshot.write() {
            // A concurrent cancel may already have sealed the snapshot;
            // never resurrect it into a live status.
            if snapshot.status.is_terminal() && !context.status.is_terminal() {
                return;
            }
            *snapshot = context.clone();
        }
    }
}
