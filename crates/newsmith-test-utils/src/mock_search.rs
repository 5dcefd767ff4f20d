// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock news and video search providers.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use newsmith_core::{CallOptions, NewsArticle, NewsSearch, NewsmithError, Video, VideoSearch};
use tokio::sync::Mutex;

type Scripted<T> = VecDeque<Result<T, String>>;

async fn pop<T>(queue: &Mutex<Scripted<T>>, default: T, code: &str) -> Result<T, NewsmithError> {
    match queue.lock().await.pop_front() {
        Some(Ok(value)) => Ok(value),
        Some(Err(message)) => Err(NewsmithError::external(code, message)),
        None => Ok(default),
    }
}

/// Mock news provider replaying scripted results per search kind.
pub struct MockNewsSearch {
    keyword_results: Arc<Mutex<Scripted<Vec<NewsArticle>>>>,
    recent_results: Arc<Mutex<Scripted<Vec<NewsArticle>>>>,
}

impl MockNewsSearch {
    pub fn new() -> Self {
        Self {
            keyword_results: Arc::new(Mutex::new(VecDeque::new())),
            recent_results: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub async fn push_keyword_result(&self, articles: Vec<NewsArticle>) {
        self.keyword_results.lock().await.push_back(Ok(articles));
    }

    pub async fn push_keyword_error(&self, message: impl Into<String>) {
        self.keyword_results
            .lock()
            .await
            .push_back(Err(message.into()));
    }

    pub async fn push_recent_result(&self, articles: Vec<NewsArticle>) {
        self.recent_results.lock().await.push_back(Ok(articles));
    }

    pub async fn push_recent_error(&self, message: impl Into<String>) {
        self.recent_results
            .lock()
            .await
            .push_back(Err(message.into()));
    }
}

impl Default for MockNewsSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NewsSearch for MockNewsSearch {
    async fn search_keywords(
        &self,
        _keywords: &[String],
        max_results: usize,
        _opts: &CallOptions,
    ) -> Result<Vec<NewsArticle>, NewsmithError> {
        let mut articles = pop(&self.keyword_results, Vec::new(), "NEWS_ERROR").await?;
        articles.truncate(max_results);
        Ok(articles)
    }

    async fn search_recent(
        &self,
        _query: &str,
        _hours_back: u32,
        max_results: usize,
        _opts: &CallOptions,
    ) -> Result<Vec<NewsArticle>, NewsmithError> {
        let mut articles = pop(&self.recent_results, Vec::new(), "NEWS_ERROR").await?;
        articles.truncate(max_results);
        Ok(articles)
    }
}

/// Mock video provider replaying scripted results and transcripts.
pub struct MockVideoSearch {
    keyword_results: Arc<Mutex<Scripted<Vec<Video>>>>,
    query_results: Arc<Mutex<Scripted<Vec<Video>>>>,
    transcripts: Arc<Mutex<Scripted<String>>>,
}

impl MockVideoSearch {
    pub fn new() -> Self {
        Self {
            keyword_results: Arc::new(Mutex::new(VecDeque::new())),
            query_results: Arc::new(Mutex::new(VecDeque::new())),
            transcripts: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub async fn push_keyword_result(&self, videos: Vec<Video>) {
        self.keyword_results.lock().await.push_back(Ok(videos));
    }

    pub async fn push_keyword_error(&self, message: impl Into<String>) {
        self.keyword_results
            .lock()
            .await
            .push_back(Err(message.into()));
    }

    pub async fn push_query_result(&self, videos: Vec<Video>) {
        self.query_results.lock().await.push_back(Ok(videos));
    }

    pub async fn push_query_error(&self, message: impl Into<String>) {
        self.query_results
            .lock()
            .await
            .push_back(Err(message.into()));
    }

    pub async fn push_transcript(&self, transcript: impl Into<String>) {
        self.transcripts.lock().await.push_back(Ok(transcript.into()));
    }

    pub async fn push_transcript_error(&self, message: impl Into<String>) {
        self.transcripts.lock().await.push_back(Err(message.into()));
    }
}

impl Default for MockVideoSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoSearch for MockVideoSearch {
    async fn search_keywords(
        &self,
        _keywords: &[String],
        max_results: usize,
        _opts: &CallOptions,
    ) -> Result<Vec<Video>, NewsmithError> {
        let mut videos = pop(&self.keyword_results, Vec::new(), "VIDEO_ERROR").await?;
        videos.truncate(max_results);
        Ok(videos)
    }

    async fn search_query(
        &self,
        _query: &str,
        max_results: usize,
        _opts: &CallOptions,
    ) -> Result<Vec<Video>, NewsmithError> {
        let mut videos = pop(&self.query_results, Vec::new(), "VIDEO_ERROR").await?;
        videos.truncate(max_results);
        Ok(videos)
    }

    async fn get_transcript(
        &self,
        video_id: &str,
        _opts: &CallOptions,
    ) -> Result<String, NewsmithError> {
        pop(
            &self.transcripts,
            format!("transcript for {video_id}"),
            "TRANSCRIPT_ERROR",
        )
        .await
    }
}
