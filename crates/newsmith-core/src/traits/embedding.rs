// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding port for vector generation.

use async_trait::async_trait;

use crate::error::NewsmithError;
use crate::traits::CallOptions;

/// Port to the embedding provider.
///
/// Batch generation with bounded concurrency and per-item retry is layered
/// on top of `embed` by the orchestrator's embedding stage.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a single text into a vector.
    async fn embed(&self, text: &str, opts: &CallOptions) -> Result<Vec<f32>, NewsmithError>;
}
