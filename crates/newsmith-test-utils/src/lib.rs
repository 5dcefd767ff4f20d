// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock adapters, in-memory ports, fixtures, and the end-to-end test
//! harness for the Newsmith pipeline.

pub mod fixtures;
pub mod harness;
pub mod in_memory;
pub mod mock_llm;
pub mod mock_search;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use in_memory::{
    HashEmbedder, InMemoryMemoryStore, InMemoryVectorStore, MockScraper, RecordingProgressSink,
};
pub use mock_llm::MockTextGenerator;
pub use mock_search::{MockNewsSearch, MockVideoSearch};
