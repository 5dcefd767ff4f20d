// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversational workflow orchestration for the Newsmith pipeline.
//!
//! The [`Orchestrator`] accepts a user query, classifies its intent, and
//! routes it through one of three branches (news retrieval, follow-up
//! discussion, chitchat), emitting ordered progress events along the way
//! and committing the conversation exchange at the end.

pub mod embedding;
pub mod executor;
mod news;
pub mod orchestrator;
pub mod progress;
pub mod registry;

pub use executor::Ports;
pub use orchestrator::Orchestrator;
pub use progress::{
    branch_stages, progress_fraction, ProgressEmitter, CHITCHAT_STAGES, FOLLOW_UP_STAGES,
    NEWS_STAGES,
};
pub use registry::LiveWorkflowRegistry;
