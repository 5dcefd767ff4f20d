// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits: narrow ports to each external collaborator.
//!
//! The core never talks to a concrete provider; every outbound call goes
//! through one of these traits and carries a [`CallOptions`] with the
//! workflow's cancellation token and the remaining deadline budget.

pub mod embedding;
pub mod llm;
pub mod memory;
pub mod progress;
pub mod scraper;
pub mod search;
pub mod vector;

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

pub use embedding::EmbeddingProvider;
pub use llm::{GenerationRequest, GenerationResponse, TextGenerator};
pub use memory::MemoryStore;
pub use progress::ProgressSink;
pub use scraper::{ScrapeOutcome, ScrapedPage, Scraper};
pub use search::{NewsSearch, VideoSearch};
pub use vector::{Collection, Filter, SimilarityHit, VectorRecord, VectorStore};

/// Cancellation and deadline context threaded through every outbound call.
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Token observed at every suspension point.
    pub cancel: CancellationToken,
    /// Absolute deadline for the enclosing request, when bounded.
    pub deadline: Option<Instant>,
}

impl CallOptions {
    pub fn new(cancel: CancellationToken, deadline: Option<Instant>) -> Self {
        Self { cancel, deadline }
    }

    /// Unbounded options with a fresh token; used by tests and tooling.
    pub fn unbounded() -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Time left before the outer deadline, or `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// A stage-local budget that never exceeds the remaining outer budget.
    pub fn stage_budget(&self, stage_timeout: Duration) -> Duration {
        match self.remaining() {
            Some(remaining) => stage_timeout.min(remaining),
            None => stage_timeout,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_budget_is_capped_by_outer_deadline() {
        let opts = CallOptions::new(
            CancellationToken::new(),
            Some(Instant::now() + Duration::from_secs(2)),
        );
        let budget = opts.stage_budget(Duration::from_secs(30));
        assert!(budget <= Duration::from_secs(2));
    }

    #[test]
    fn unbounded_options_use_stage_timeout() {
        let opts = CallOptions::unbounded();
        assert_eq!(
            opts.stage_budget(Duration::from_secs(30)),
            Duration::from_secs(30)
        );
        assert!(opts.remaining().is_none());
    }
}
