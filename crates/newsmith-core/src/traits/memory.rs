// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value memory store port for conversation and workflow state.

use async_trait::async_trait;

use crate::error::NewsmithError;
use crate::traits::CallOptions;
use crate::types::{ConversationContext, WorkflowContext};

/// Port to the persistence backend for dialogue and workflow state.
///
/// Implementations apply a 7-day TTL to conversations and a 6-hour TTL to
/// workflow state snapshots.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Loads a user's conversation context; `Ok(None)` when absent.
    async fn load_conversation(
        &self,
        user_id: &str,
        opts: &CallOptions,
    ) -> Result<Option<ConversationContext>, NewsmithError>;

    /// Atomically replaces a user's conversation context.
    async fn save_conversation(
        &self,
        context: &ConversationContext,
        opts: &CallOptions,
    ) -> Result<(), NewsmithError>;

    /// Removes a user's conversation context.
    async fn clear_conversation(
        &self,
        user_id: &str,
        opts: &CallOptions,
    ) -> Result<(), NewsmithError>;

    /// Persists a workflow state snapshot for status queries and debugging.
    async fn save_workflow_state(
        &self,
        context: &WorkflowContext,
        opts: &CallOptions,
    ) -> Result<(), NewsmithError>;

    /// Loads a workflow state snapshot; `Ok(None)` when absent or expired.
    async fn load_workflow_state(
        &self,
        workflow_id: &str,
        opts: &CallOptions,
    ) -> Result<Option<WorkflowContext>, NewsmithError>;
}
