// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Article scraper port.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NewsmithError;
use crate::traits::CallOptions;

/// Result of scraping one URL. Content extraction prefers paragraph-level
/// text with boilerplate (subscribe/follow/cookie/terms lines) removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub url: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a batch scrape.
#[derive(Debug, Clone, Default)]
pub struct ScrapeOutcome {
    pub ok: Vec<ScrapedPage>,
    /// URLs that failed after the configured retries.
    pub failed: Vec<String>,
}

/// Port to the HTML scraper.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Scrapes a single URL within the given deadline.
    async fn scrape(
        &self,
        url: &str,
        deadline: Duration,
        opts: &CallOptions,
    ) -> Result<ScrapedPage, NewsmithError>;

    /// Scrapes many URLs with bounded concurrency and per-URL timeout.
    async fn scrape_many(
        &self,
        urls: &[String],
        concurrency: usize,
        per_url_timeout: Duration,
        retries: u32,
        opts: &CallOptions,
    ) -> Result<ScrapeOutcome, NewsmithError>;
}
