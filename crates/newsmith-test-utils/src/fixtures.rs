// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sample domain objects for tests.

use chrono::{Duration, Utc};
use newsmith_core::{NewsArticle, UserPreferences, Video, WorkflowRequest};

/// A well-formed article with a deterministic URL-derived id.
pub fn article(index: usize) -> NewsArticle {
    let url = format!("https://news.example.com/story-{index}");
    NewsArticle {
        id: NewsArticle::id_for_url(&url),
        title: format!("Story {index}: markets react"),
        url,
        source: "Example Wire".to_string(),
        author: Some("Staff Reporter".to_string()),
        published_at: Some(Utc::now() - Duration::hours(index as i64)),
        description: format!("Developments in story {index} continue"),
        content: String::new(),
        image_url: String::new(),
        category: "business".to_string(),
        relevance_score: None,
    }
}

pub fn articles(count: usize) -> Vec<NewsArticle> {
    (0..count).map(article).collect()
}

/// A well-formed video.
pub fn video(index: usize) -> Video {
    Video {
        id: format!("video-{index}"),
        title: format!("Video {index}: what happened"),
        description: format!("Coverage of event {index}"),
        transcript: None,
        channel_id: "chan-1".to_string(),
        channel: "Example News".to_string(),
        thumbnail_url: String::new(),
        published_at: Some(Utc::now() - Duration::hours(index as i64)),
        url: format!("https://videos.example.com/video-{index}"),
        tags: vec!["news".to_string()],
        view_count: Some(1000 * (index as u64 + 1)),
        like_count: None,
        comment_count: None,
        duration: Some("PT4M".to_string()),
        relevancy_score: None,
    }
}

pub fn videos(count: usize) -> Vec<Video> {
    (0..count).map(video).collect()
}

/// A workflow request with the given user and query.
pub fn request(user_id: &str, query: &str) -> WorkflowRequest {
    WorkflowRequest {
        user_id: user_id.to_string(),
        query: query.to_string(),
        workflow_id: None,
        user_preferences: UserPreferences {
            news_personality: "friendly-explainer".to_string(),
            favourite_topics: vec!["markets".to_string()],
            response_length: "concise".to_string(),
        },
    }
}

/// The classifier JSON for a given intent tag.
pub fn classification_json(intent: &str, confidence: f32) -> String {
    format!(
        r#"{{"intent": "{intent}", "confidence": {confidence}, "reasoning": "scripted"}}"#
    )
}

/// A ranking response accepting the first `count` candidates at the given
/// score, for the article collection.
pub fn article_ranking_json(count: usize, score: f32) -> String {
    let entries: Vec<String> = (0..count)
        .map(|i| format!(r#"{{"id": {i}, "relevance_score": {score}}}"#))
        .collect();
    format!(r#"{{"relevant_articles": [{}]}}"#, entries.join(","))
}

/// A ranking response accepting the first `count` candidates at the given
/// score, for the video collection.
pub fn video_ranking_json(count: usize, score: f32) -> String {
    let entries: Vec<String> = (0..count)
        .map(|i| format!(r#"{{"id": {i}, "relevance_score": {score}}}"#))
        .collect();
    format!(r#"{{"relevant_videos": [{}]}}"#, entries.join(","))
}
