// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Progress-event envelope published to the per-user update stream.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Hard cap on entries per user stream; receivers drop the oldest beyond it.
pub const PROGRESS_STREAM_CAP: usize = 1024;

/// Status of a stage (or envelope event) as seen by stream consumers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Skipped,
    Retrying,
    Timeout,
}

/// Discriminator for stream records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    WorkflowStarted,
    AgentUpdate,
    WorkflowCompleted,
    WorkflowError,
}

/// One record on a user's progress stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentUpdate {
    #[serde(rename = "type")]
    pub update_type: UpdateType,
    pub workflow_id: String,
    pub request_id: String,
    /// Stage name, or the event type string for envelope events.
    pub agent_name: String,
    pub status: AgentStatus,
    pub message: String,
    /// Fraction of the branch completed, in [0, 1].
    pub progress: f32,
    pub timestamp: DateTime<Utc>,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

impl AgentUpdate {
    pub fn new(
        update_type: UpdateType,
        workflow_id: impl Into<String>,
        request_id: impl Into<String>,
        agent_name: impl Into<String>,
        status: AgentStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            update_type,
            workflow_id: workflow_id.into(),
            request_id: request_id.into(),
            agent_name: agent_name.into(),
            status,
            message: message.into(),
            progress: 0.0,
            timestamp: Utc::now(),
            retryable: status == AgentStatus::Failed,
            data: None,
            error: None,
            processing_time_ms: None,
        }
    }

    pub fn with_progress(mut self, progress: f32) -> Self {
        self.progress = progress.clamp(0.0, 1.0);
        self
    }

    pub fn with_data(mut self, data: BTreeMap<String, serde_json::Value>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_processing_time_ms(mut self, millis: u64) -> Self {
        self.processing_time_ms = Some(millis);
        self
    }
}
