// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Progress stream port.

use async_trait::async_trait;

use crate::error::NewsmithError;
use crate::traits::CallOptions;
use crate::update::AgentUpdate;

/// Port to the per-user progress stream.
///
/// Streams are append-only and capped at
/// [`crate::update::PROGRESS_STREAM_CAP`] entries; implementations drop the
/// oldest entry when the cap is reached. Ordering within one stream is
/// preserved; there is no ordering across users.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Publishes one update onto the user's stream.
    async fn publish(
        &self,
        user_id: &str,
        update: AgentUpdate,
        opts: &CallOptions,
    ) -> Result<(), NewsmithError>;
}
