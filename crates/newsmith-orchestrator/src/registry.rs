// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live-workflow registry.
//!
//! A process-wide concurrent map keyed by workflow id. The executor owns
//! the working [`WorkflowContext`]; the registry holds the workflow's
//! cancellation token plus a status snapshot the executor refreshes at
//! stage boundaries, so external status queries never touch executor state.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use newsmith_core::{NewsmithError, WorkflowContext};
use tokio_util::sync::CancellationToken;

/// Shared snapshot handle for one live workflow.
pub type WorkflowSnapshot = Arc<RwLock<WorkflowContext>>;

struct RegistryEntry {
    cancel: CancellationToken,
    snapshot: WorkflowSnapshot,
}

/// Concurrent map of live workflows. Insert on start, delete on end,
/// load-by-id for status queries, iterate (via `count`) for shutdown
/// polling. No ordering guarantees across concurrent inserts.
#[derive(Default)]
pub struct LiveWorkflowRegistry {
    entries: DashMap<String, RegistryEntry>,
}

impl LiveWorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a workflow. A second submission of the same id while the
    /// first is live is rejected, keeping at most one live entry per id.
    pub fn insert(
        &self,
        context: &WorkflowContext,
    ) -> Result<(CancellationToken, WorkflowSnapshot), NewsmithError> {
        let cancel = CancellationToken::new();
        let snapshot: WorkflowSnapshot = Arc::new(RwLock::new(context.clone()));
        let entry = RegistryEntry {
            cancel: cancel.clone(),
            snapshot: snapshot.clone(),
        };
        match self.entries.entry(context.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(NewsmithError::validation(
                "WORKFLOW_ALREADY_ACTIVE",
                format!("workflow {} is already executing", context.id),
            )),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok((cancel, snapshot))
            }
        }
    }

    /// Removes a workflow on exit. Safe to call for ids already removed.
    pub fn remove(&self, workflow_id: &str) {
        self.entries.remove(workflow_id);
    }

    /// Snapshot of a live workflow's context, if present.
    pub fn snapshot(&self, workflow_id: &str) -> Option<WorkflowContext> {
        self.entries
            .get(workflow_id)
            .map(|entry| entry.snapshot.read().expect("snapshot lock poisoned").clone())
    }

    /// Cancels a live workflow: triggers its token and marks the snapshot
    /// failed so status queries reflect cancellation immediately. Returns
    /// the failed snapshot, or `None` when the id is not live.
    pub fn cancel(&self, workflow_id: &str) -> Option<WorkflowContext> {
        let entry = self.entries.get(workflow_id)?;
        entry.cancel.cancel();
        let mut snapshot = entry.snapshot.write().expect("snapshot lock poisoned");
        snapshot.mark_failed();
        Some(snapshot.clone())
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsmith_core::{UserPreferences, WorkflowRequest, WorkflowStatus};

    fn context(id: &str) -> WorkflowContext {
        WorkflowContext::new(
            &WorkflowRequest {
                user_id: "u".to_string(),
                query: "q".to_string(),
                workflow_id: Some(id.to_string()),
                user_preferences: UserPreferences::default(),
            },
            "req-1",
        )
    }

    #[test]
    fn duplicate_ids_keep_a_single_entry() {
        let registry = LiveWorkflowRegistry::new();
        let ctx = context("wf-1");
        registry.insert(&ctx).unwrap();
        let err = registry.insert(&ctx).unwrap_err();
        assert_eq!(err.code, "WORKFLOW_ALREADY_ACTIVE");
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn cancel_marks_snapshot_failed_and_triggers_token() {
        let registry = LiveWorkflowRegistry::new();
        let ctx = context("wf-1");
        let (cancel, _snapshot) = registry.insert(&ctx).unwrap();
        assert!(!cancel.is_cancelled());

        let failed = registry.cancel("wf-1").unwrap();
        assert!(cancel.is_cancelled());
        assert_eq!(failed.status, WorkflowStatus::Failed);
        assert!(failed.end_time.is_some());

        let seen = registry.snapshot("wf-1").unwrap();
        assert_eq!(seen.status, WorkflowStatus::Failed);
    }

    #[test]
    fn cancel_unknown_id_is_none() {
        let registry = LiveWorkflowRegistry::new();
        assert!(registry.cancel("missing").is_none());
    }

    #[test]
    fn remove_clears_entry() {
        let registry = LiveWorkflowRegistry::new();
        let ctx = context("wf-1");
        registry.insert(&ctx).unwrap();
        registry.remove("wf-1");
        assert!(registry.is_empty());
        assert!(registry.snapshot("wf-1").is_none());
    }
}
