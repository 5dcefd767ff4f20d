// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Progress emission.
//!
//! The progress fraction is a pure function of (branch, stage name, event
//! status) computed from the canonical branch tables below, never from
//! stage-local counters, so emitters cannot drift from the consumer's view
//! of the pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;

use newsmith_core::{
    AgentStatus, AgentUpdate, CallOptions, Intent, NewsmithError, ProgressSink, UpdateType,
    WorkflowContext,
};
use tracing::error;

/// Canonical stage order of the news branch.
pub const NEWS_STAGES: [&str; 12] = [
    "memory",
    "classifier",
    "query_enhancer",
    "keyword_extractor",
    "news_fetch",
    "video_fetch",
    "embedding_generation",
    "vector_storage",
    "relevancy",
    "scraper",
    "summarizer",
    "persona",
];

/// Canonical stage order of the chitchat branch.
pub const CHITCHAT_STAGES: [&str; 3] = ["memory", "classifier", "chitchat"];

/// Canonical stage order of the follow-up branch. The responder differs
/// (contextual rather than open-domain) but the stage name consumers see
/// is shared with the chitchat branch.
pub const FOLLOW_UP_STAGES: [&str; 3] = ["memory", "classifier", "chitchat"];

/// The stage list for a branch; empty before the intent is known.
pub fn branch_stages(intent: Option<Intent>) -> &'static [&'static str] {
    match intent {
        Some(Intent::NewNewsQuery) => &NEWS_STAGES,
        Some(Intent::Chitchat) => &CHITCHAT_STAGES,
        Some(Intent::FollowUpDiscussion) => &FOLLOW_UP_STAGES,
        None => &[],
    }
}

/// Progress fraction for a stage event:
/// `processing` -> (index + 0.5) / total, `completed` -> (index + 1) / total,
/// `failed` -> index / total. Unknown branches or stages report 0.
pub fn progress_fraction(intent: Option<Intent>, stage: &str, status: AgentStatus) -> f32 {
    let stages = branch_stages(intent);
    let Some(index) = stages.iter().position(|s| *s == stage) else {
        return 0.0;
    };
    let total = stages.len() as f32;
    let index = index as f32;
    match status {
        AgentStatus::Processing => (index + 0.5) / total,
        AgentStatus::Completed => (index + 1.0) / total,
        AgentStatus::Failed => index / total,
        _ => index / total,
    }
}

/// Per-workflow emitter over the [`ProgressSink`] port.
///
/// Publish failures are logged and swallowed: progress is observability,
/// never control flow. Stage events stop once the workflow's cancellation
/// token fires; envelope events are always delivered.
pub struct ProgressEmitter {
    sink: Arc<dyn ProgressSink>,
    user_id: String,
    workflow_id: String,
    request_id: String,
}

impl ProgressEmitter {
    pub fn new(
        sink: Arc<dyn ProgressSink>,
        user_id: impl Into<String>,
        workflow_id: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            sink,
            user_id: user_id.into(),
            workflow_id: workflow_id.into(),
            request_id: request_id.into(),
        }
    }

    /// Emits one stage event. Suppressed after cancellation so a cancelled
    /// workflow publishes nothing beyond its terminal envelope.
    pub async fn stage(
        &self,
        context: &WorkflowContext,
        stage: &str,
        status: AgentStatus,
        message: impl Into<String>,
        opts: &CallOptions,
    ) {
        if opts.is_cancelled() {
            return;
        }
        let progress = progress_fraction(context.intent, stage, status);
        let mut data = BTreeMap::new();
        if let Some(intent) = context.intent {
            data.insert(
                "workflow_type".to_string(),
                serde_json::Value::String(intent.to_string()),
            );
            data.insert(
                "total_agents".to_string(),
                serde_json::Value::from(branch_stages(context.intent).len()),
            );
        }
        data.insert(
            "is_follow_up".to_string(),
            serde_json::Value::Bool(context.is_follow_up),
        );
        if !context.referenced_topic.is_empty() {
            data.insert(
                "referenced_topic".to_string(),
                serde_json::Value::String(context.referenced_topic.clone()),
            );
        }

        let update = AgentUpdate::new(
            UpdateType::AgentUpdate,
            &self.workflow_id,
            &self.request_id,
            stage,
            status,
            message,
        )
        .with_progress(progress)
        .with_data(data);

        self.publish(update, opts).await;
    }

    /// Emits a `workflow_started` / `workflow_completed` / `workflow_error`
    /// envelope. Always delivered, including for cancelled workflows.
    pub async fn envelope(
        &self,
        update_type: UpdateType,
        message: impl Into<String>,
        error_message: Option<String>,
        opts: &CallOptions,
    ) {
        let progress = match update_type {
            UpdateType::WorkflowStarted => 0.0,
            _ => 1.0,
        };
        let status = match update_type {
            UpdateType::WorkflowError => AgentStatus::Failed,
            _ => AgentStatus::Completed,
        };
        let mut update = AgentUpdate::new(
            update_type,
            &self.workflow_id,
            &self.request_id,
            update_type.to_string(),
            status,
            message,
        )
        .with_progress(progress);
        if let Some(err) = error_message {
            update = update.with_error(err);
        }
        self.publish(update, opts).await;
    }

    async fn publish(&self, update: AgentUpdate, opts: &CallOptions) {
        if let Err(err) = self.sink.publish(&self.user_id, update, opts).await {
            error!(
                workflow_id = self.workflow_id.as_str(),
                error = %err,
                "failed to publish progress update"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn news_branch_has_twelve_stages() {
        assert_eq!(NEWS_STAGES.len(), 12);
        assert_eq!(CHITCHAT_STAGES.len(), 3);
        assert_eq!(FOLLOW_UP_STAGES.len(), 3);
    }

    #[test]
    fn fraction_matches_topology() {
        let news = Some(Intent::NewNewsQuery);
        assert_eq!(
            progress_fraction(news, "memory", AgentStatus::Processing),
            0.5 / 12.0
        );
        assert_eq!(
            progress_fraction(news, "memory", AgentStatus::Completed),
            1.0 / 12.0
        );
        assert_eq!(progress_fraction(news, "memory", AgentStatus::Failed), 0.0);
        assert_eq!(
            progress_fraction(news, "persona", AgentStatus::Completed),
            1.0
        );
    }

    #[test]
    fn chitchat_fractions_use_three_stages() {
        let chat = Some(Intent::Chitchat);
        assert_eq!(
            progress_fraction(chat, "chitchat", AgentStatus::Processing),
            2.5 / 3.0
        );
        assert_eq!(
            progress_fraction(chat, "chitchat", AgentStatus::Completed),
            1.0
        );
    }

    #[test]
    fn unknown_branch_or_stage_is_zero() {
        assert_eq!(progress_fraction(None, "memory", AgentStatus::Completed), 0.0);
        assert_eq!(
            progress_fraction(Some(Intent::Chitchat), "news_fetch", AgentStatus::Completed),
            0.0
        );
    }

    #[test]
    fn every_canonical_stage_has_a_policy_entry() {
        let configs = newsmith_core::stage::default_agent_configs();
        for stage in NEWS_STAGES
            .iter()
            .chain(CHITCHAT_STAGES.iter())
            .chain(FOLLOW_UP_STAGES.iter())
        {
            assert!(
                configs.contains_key(*stage),
                "stage {stage} has no execution policy"
            );
        }
    }

    #[test]
    fn completed_progress_is_monotonic_over_news_stage_order() {
        let news = Some(Intent::NewNewsQuery);
        let mut last = 0.0f32;
        for stage in NEWS_STAGES {
            let processing = progress_fraction(news, stage, AgentStatus::Processing);
            let completed = progress_fraction(news, stage, AgentStatus::Completed);
            assert!(processing >= last);
            assert!(completed > processing);
            last = completed;
        }
        assert_eq!(last, 1.0);
    }
}
