// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The orchestrator: workflow submission, cancellation, status queries,
//! and graceful shutdown.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use newsmith_core::stage::{default_agent_configs, AgentConfig};
use newsmith_core::{
    CallOptions, Intent, NewsmithError, UpdateType, WorkflowContext, WorkflowRequest,
    WorkflowResponse, WorkflowStatus,
};
use newsmith_config::NewsmithConfig;
use tracing::{error, info, warn};

use crate::executor::{Ports, WorkflowExecutor};
use crate::progress::ProgressEmitter;
use crate::registry::LiveWorkflowRegistry;

/// Coordinates workflow execution over the collaborator ports.
pub struct Orchestrator {
    ports: Arc<Ports>,
    config: NewsmithConfig,
    stage_configs: Arc<BTreeMap<String, AgentConfig>>,
    registry: Arc<LiveWorkflowRegistry>,
    started_at: Instant,
}

impl Orchestrator {
    pub fn new(ports: Ports, config: NewsmithConfig) -> Self {
        let stage_configs = Arc::new(default_agent_configs());
        info!(
            request_timeout_secs = config.workflow.request_timeout_secs,
            stages_configured = stage_configs.len(),
            "orchestrator initialized"
        );
        Self {
            ports: Arc::new(ports),
            config,
            stage_configs,
            registry: Arc::new(LiveWorkflowRegistry::new()),
            started_at: Instant::now(),
        }
    }

    /// The per-stage execution policy table.
    pub fn stage_configs(&self) -> &BTreeMap<String, AgentConfig> {
        &self.stage_configs
    }

    /// Executes one workflow end to end and returns its terminal response.
    ///
    /// The registry entry is always removed on exit, the conversation
    /// exchange is appended only on success, and the final (possibly
    /// partial) context is persisted best-effort either way.
    pub async fn execute(&self, request: WorkflowRequest) -> WorkflowResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        let mut context = WorkflowContext::new(&request, request_id.clone());
        let workflow_id = context.id.clone();

        let (cancel, snapshot) = match self.registry.insert(&context) {
            Ok(handles) => handles,
            Err(err) => {
                warn!(workflow_id = workflow_id.as_str(), error = %err, "workflow rejected");
                return WorkflowResponse::new(workflow_id, request_id, "failed", err.to_string());
            }
        };

        let deadline = Instant::now() + Duration::from_secs(self.config.workflow.request_timeout_secs);
        let opts = CallOptions::new(cancel, Some(deadline));

        info!(
            workflow_id = workflow_id.as_str(),
            user_id = context.user_id.as_str(),
            "workflow started"
        );

        // Best effort: the initial state write must not fail the workflow.
        if let Err(err) = self
            .ports
            .state_store
            .save_workflow_state(&context, &opts)
            .await
        {
            error!(workflow_id = workflow_id.as_str(), error = %err, "failed to store initial workflow state");
        }

        let emitter = ProgressEmitter::new(
            self.ports.progress.clone(),
            &context.user_id,
            &workflow_id,
            &request_id,
        );
        emitter
            .envelope(UpdateType::WorkflowStarted, "Workflow started", None, &opts)
            .await;

        let executor = WorkflowExecutor::new(
            self.ports.clone(),
            self.config.clone(),
            emitter,
            opts.clone(),
            self.stage_configs.clone(),
            snapshot.clone(),
        );

        let result = match context.status {
            WorkflowStatus::Pending => executor.run(&mut context).await,
            other => Err(NewsmithError::internal(
                "INVALID_WORKFLOW_STATE",
                format!("invalid workflow status: {other}"),
            )),
        };

        let emitter = ProgressEmitter::new(
            self.ports.progress.clone(),
            &context.user_id,
            &workflow_id,
            &request_id,
        );
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let response = match result {
            Ok(()) => {
                self.append_exchange(&mut context, elapsed_ms);
                if let Err(err) = self.ports.conversations.commit(&context.conversation, &opts).await
                {
                    error!(workflow_id = workflow_id.as_str(), error = %err, "failed to store conversation exchange");
                }

                context.mark_completed();
                executor.sync_snapshot(&context);
                info!(
                    workflow_id = workflow_id.as_str(),
                    duration_ms = elapsed_ms,
                    "workflow completed"
                );

                let final_message = context
                    .response
                    .clone()
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "Workflow completed successfully".to_string());
                emitter
                    .envelope(
                        UpdateType::WorkflowCompleted,
                        final_message.clone(),
                        None,
                        &opts,
                    )
                    .await;

                let mut response =
                    WorkflowResponse::new(&workflow_id, &request_id, "completed", final_message);
                response.total_time_ms = Some(elapsed_ms);
                response
            }
            Err(err) => {
                let err = err.with_context(&request_id, &workflow_id, &context.user_id);
                context.mark_failed();
                executor.sync_snapshot(&context);
                error!(
                    workflow_id = workflow_id.as_str(),
                    duration_ms = elapsed_ms,
                    error = %err,
                    "workflow failed"
                );
                emitter
                    .envelope(
                        UpdateType::WorkflowError,
                        format!("Workflow failed: {err}"),
                        Some(err.to_string()),
                        &opts,
                    )
                    .await;

                let mut response =
                    WorkflowResponse::new(&workflow_id, &request_id, "failed", err.to_string());
                response.total_time_ms = Some(elapsed_ms);
                response
            }
        };

        // Persist the terminal context for status queries and debugging.
        if let Err(err) = self
            .ports
            .state_store
            .save_workflow_state(&context, &opts)
            .await
        {
            error!(workflow_id = workflow_id.as_str(), error = %err, "failed to store final workflow state");
        }

        self.registry.remove(&workflow_id);
        response
    }

    /// Appends the committed exchange to the embedded conversation.
    fn append_exchange(&self, context: &mut WorkflowContext, elapsed_ms: u64) {
        let response = context.response.clone().unwrap_or_default();
        let intent = context.intent.unwrap_or(Intent::Chitchat);

        let topics: Vec<String> = if !context.referenced_topic.is_empty() {
            vec![context.referenced_topic.clone()]
        } else if intent == Intent::NewNewsQuery {
            vec![context.effective_query().to_string()]
        } else {
            Vec::new()
        };
        let keywords = context.keywords.clone();
        let query = context.original_query.clone();

        context
            .conversation
            .add_exchange(&query, &response, intent, &topics, &[], &keywords, elapsed_ms);
    }

    /// Cancels a live workflow. In-flight stages observe the token at
    /// their next suspension point; the snapshot is failed immediately.
    pub async fn cancel(&self, workflow_id: &str) -> Result<(), NewsmithError> {
        match self.registry.cancel(workflow_id) {
            Some(snapshot) => {
                // Persist the cancelled state so status queries agree once
                // the entry leaves the registry.
                let opts = CallOptions::unbounded();
                if let Err(err) = self
                    .ports
                    .state_store
                    .save_workflow_state(&snapshot, &opts)
                    .await
                {
                    error!(workflow_id, error = %err, "failed to store cancelled workflow state");
                }
                info!(workflow_id, "workflow cancelled");
                Ok(())
            }
            None => Err(NewsmithError::not_found(
                "WORKFLOW_NOT_FOUND",
                format!("workflow {workflow_id} not found or not active"),
            )),
        }
    }

    /// Status snapshot: live registry first, then the persistent store.
    pub async fn get_status(&self, workflow_id: &str) -> Result<WorkflowContext, NewsmithError> {
        if let Some(snapshot) = self.registry.snapshot(workflow_id) {
            return Ok(snapshot);
        }
        let opts = CallOptions::unbounded();
        match self
            .ports
            .state_store
            .load_workflow_state(workflow_id, &opts)
            .await?
        {
            Some(context) => Ok(context),
            None => Err(NewsmithError::not_found(
                "WORKFLOW_NOT_FOUND",
                format!("workflow {workflow_id} not found"),
            )),
        }
    }

    /// Number of live workflows.
    pub fn active_count(&self) -> usize {
        self.registry.count()
    }

    /// Clears a user's persisted conversation.
    pub async fn clear_conversation(&self, user_id: &str) -> Result<(), NewsmithError> {
        self.ports
            .conversations
            .clear(user_id, &CallOptions::unbounded())
            .await
    }

    /// Liveness summary for the health endpoint.
    pub fn health(&self) -> serde_json::Value {
        serde_json::json!({
            "status": "ok",
            "active_workflows": self.active_count(),
            "configured_stages": self.stage_configs.len(),
            "uptime_seconds": self.started_at.elapsed().as_secs(),
        })
    }

    /// Waits up to the configured grace period for live workflows to
    /// drain, polling the registry. Returns unconditionally at timeout.
    pub async fn close(&self) {
        info!("orchestrator shutting down");
        let grace = Duration::from_secs(self.config.workflow.shutdown_grace_secs);
        let deadline = Instant::now() + grace;
        let mut ticker = tokio::time::interval(Duration::from_secs(1));

        loop {
            if self.registry.is_empty() {
                info!("all workflows completed, orchestrator closed");
                return;
            }
            if Instant::now() >= deadline {
                warn!(
                    active_workflows = self.registry.count(),
                    "timeout waiting for workflows to complete"
                );
                return;
            }
            ticker.tick().await;
        }
    }
}
