// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! News and video search ports.

use async_trait::async_trait;

use crate::error::NewsmithError;
use crate::traits::CallOptions;
use crate::types::{NewsArticle, Video};

/// Port to the news search provider.
#[async_trait]
pub trait NewsSearch: Send + Sync {
    /// AND-joined keyword search, newest first.
    async fn search_keywords(
        &self,
        keywords: &[String],
        max_results: usize,
        opts: &CallOptions,
    ) -> Result<Vec<NewsArticle>, NewsmithError>;

    /// Free-text search restricted to the last `hours_back` hours.
    async fn search_recent(
        &self,
        query: &str,
        hours_back: u32,
        max_results: usize,
        opts: &CallOptions,
    ) -> Result<Vec<NewsArticle>, NewsmithError>;
}

/// Port to the video search provider.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Keyword search scoped to news content.
    async fn search_keywords(
        &self,
        keywords: &[String],
        max_results: usize,
        opts: &CallOptions,
    ) -> Result<Vec<Video>, NewsmithError>;

    /// Free-text query search.
    async fn search_query(
        &self,
        query: &str,
        max_results: usize,
        opts: &CallOptions,
    ) -> Result<Vec<Video>, NewsmithError>;

    /// Caption-derived transcript for a video.
    async fn get_transcript(
        &self,
        video_id: &str,
        opts: &CallOptions,
    ) -> Result<String, NewsmithError>;
}
