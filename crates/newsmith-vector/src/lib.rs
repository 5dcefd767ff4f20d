// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector-store gateway.
//!
//! Builds [`VectorRecord`]s for articles and videos (deterministic ids,
//! metadata rich enough to reconstruct the item on retrieval), enforces the
//! equal-length non-empty precondition at every store call site, and maps
//! similarity hits back into domain types.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use newsmith_core::{
    CallOptions, Collection, Filter, NewsArticle, NewsmithError, SimilarityHit, VectorRecord,
    VectorStore, Video,
};
use tracing::debug;

/// Gateway over the [`VectorStore`] port.
pub struct VectorGateway {
    store: Arc<dyn VectorStore>,
}

impl VectorGateway {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Stores articles with their embeddings.
    ///
    /// Precondition: both slices non-empty and of equal length.
    pub async fn store_articles(
        &self,
        articles: &[NewsArticle],
        embeddings: &[Vec<f32>],
        opts: &CallOptions,
    ) -> Result<usize, NewsmithError> {
        check_store_preconditions("articles", articles.len(), embeddings.len())?;
        let records = articles
            .iter()
            .zip(embeddings.iter())
            .map(|(article, embedding)| article_record(article, embedding.clone()))
            .collect::<Vec<_>>();
        let count = records.len();
        self.store.store(Collection::Articles, records, opts).await?;
        debug!(count, "stored article vectors");
        Ok(count)
    }

    /// Stores videos with their embeddings. Same precondition as articles.
    pub async fn store_videos(
        &self,
        videos: &[Video],
        embeddings: &[Vec<f32>],
        opts: &CallOptions,
    ) -> Result<usize, NewsmithError> {
        check_store_preconditions("videos", videos.len(), embeddings.len())?;
        let records = videos
            .iter()
            .zip(embeddings.iter())
            .map(|(video, embedding)| video_record(video, embedding.clone()))
            .collect::<Vec<_>>();
        let count = records.len();
        self.store.store(Collection::Videos, records, opts).await?;
        debug!(count, "stored video vectors");
        Ok(count)
    }

    /// Semantic neighbours for a query embedding in the article collection.
    pub async fn similar_articles(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&Filter>,
        opts: &CallOptions,
    ) -> Result<Vec<NewsArticle>, NewsmithError> {
        let hits = self
            .store
            .query_similar(Collection::Articles, embedding, top_k, filter, opts)
            .await?;
        Ok(hits.iter().filter_map(article_from_hit).collect())
    }

    /// Semantic neighbours for a query embedding in the video collection.
    pub async fn similar_videos(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&Filter>,
        opts: &CallOptions,
    ) -> Result<Vec<Video>, NewsmithError> {
        let hits = self
            .store
            .query_similar(Collection::Videos, embedding, top_k, filter, opts)
            .await?;
        Ok(hits.iter().filter_map(video_from_hit).collect())
    }

    /// Deletes article vectors by id.
    pub async fn delete_articles(
        &self,
        ids: &[String],
        opts: &CallOptions,
    ) -> Result<(), NewsmithError> {
        self.store.delete(Collection::Articles, ids, opts).await
    }

    /// Deletes video vectors by id.
    pub async fn delete_videos(
        &self,
        ids: &[String],
        opts: &CallOptions,
    ) -> Result<(), NewsmithError> {
        self.store.delete(Collection::Videos, ids, opts).await
    }
}

fn check_store_preconditions(
    what: &str,
    items: usize,
    embeddings: usize,
) -> Result<(), NewsmithError> {
    if items == 0 || embeddings == 0 {
        return Err(NewsmithError::validation(
            "VECTOR_STORE_EMPTY",
            format!("refusing to store empty {what} batch"),
        ));
    }
    if items != embeddings {
        return Err(NewsmithError::validation(
            "VECTOR_STORE_LENGTH_MISMATCH",
            format!("{what}: {items} items but {embeddings} embeddings"),
        ));
    }
    Ok(())
}

/// Builds the article record. Id derives from the URL so re-storing the
/// same article overwrites rather than duplicates.
fn article_record(article: &NewsArticle, embedding: Vec<f32>) -> VectorRecord {
    let mut metadata = BTreeMap::new();
    let mut put = |key: &str, value: serde_json::Value| {
        metadata.insert(key.to_string(), value);
    };
    put("title", article.title.clone().into());
    put("url", article.url.clone().into());
    put("source", article.source.clone().into());
    put("description", article.description.clone().into());
    put("category", article.category.clone().into());
    put("image_url", article.image_url.clone().into());
    if let Some(author) = &article.author {
        put("author", author.clone().into());
    }
    if let Some(published) = article.published_at {
        put("published_at", published.to_rfc3339().into());
    }

    VectorRecord {
        id: NewsArticle::id_for_url(&article.url),
        document: format!("{} - {}", article.title, article.description),
        metadata,
        embedding,
    }
}

/// Builds the video record keyed by the provider's video id.
fn video_record(video: &Video, embedding: Vec<f32>) -> VectorRecord {
    let mut metadata = BTreeMap::new();
    let mut put = |key: &str, value: serde_json::Value| {
        metadata.insert(key.to_string(), value);
    };
    put("title", video.title.clone().into());
    put("url", video.url.clone().into());
    put("channel", video.channel.clone().into());
    put("channel_id", video.channel_id.clone().into());
    put("description", video.description.clone().into());
    put("thumbnail_url", video.thumbnail_url.clone().into());
    put("tags", video.tags.join(",").into());
    if let Some(published) = video.published_at {
        put("published_at", published.to_rfc3339().into());
    }
    if let Some(views) = video.view_count {
        put("view_count", views.into());
    }
    if let Some(duration) = &video.duration {
        put("duration", duration.clone().into());
    }

    VectorRecord {
        id: video.id.clone(),
        document: format!("{} - {}", video.title, video.description),
        metadata,
        embedding,
    }
}

fn get_string(metadata: &BTreeMap<String, serde_json::Value>, key: &str) -> String {
    metadata
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn get_timestamp(
    metadata: &BTreeMap<String, serde_json::Value>,
    key: &str,
) -> Option<DateTime<Utc>> {
    metadata
        .get(key)
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Reconstructs an article from a hit, carrying the similarity as its
/// relevance score. Hits without a title or URL are dropped.
fn article_from_hit(hit: &SimilarityHit) -> Option<NewsArticle> {
    let article = NewsArticle {
        id: hit.id.clone(),
        title: get_string(&hit.metadata, "title"),
        url: get_string(&hit.metadata, "url"),
        source: get_string(&hit.metadata, "source"),
        author: hit
            .metadata
            .get("author")
            .and_then(|v| v.as_str())
            .map(String::from),
        published_at: get_timestamp(&hit.metadata, "published_at"),
        description: get_string(&hit.metadata, "description"),
        content: String::new(),
        image_url: get_string(&hit.metadata, "image_url"),
        category: get_string(&hit.metadata, "category"),
        relevance_score: Some(hit.similarity.clamp(0.0, 1.0)),
    };
    article.is_well_formed().then_some(article)
}

/// Reconstructs a video from a hit. Hits without a title or URL are dropped.
fn video_from_hit(hit: &SimilarityHit) -> Option<Video> {
    let tags_raw = get_string(&hit.metadata, "tags");
    let video = Video {
        id: hit.id.clone(),
        title: get_string(&hit.metadata, "title"),
        description: get_string(&hit.metadata, "description"),
        transcript: None,
        channel_id: get_string(&hit.metadata, "channel_id"),
        channel: get_string(&hit.metadata, "channel"),
        thumbnail_url: get_string(&hit.metadata, "thumbnail_url"),
        published_at: get_timestamp(&hit.metadata, "published_at"),
        url: get_string(&hit.metadata, "url"),
        tags: if tags_raw.is_empty() {
            Vec::new()
        } else {
            tags_raw.split(',').map(String::from).collect()
        },
        view_count: hit.metadata.get("view_count").and_then(|v| v.as_u64()),
        like_count: None,
        comment_count: None,
        duration: hit
            .metadata
            .get("duration")
            .and_then(|v| v.as_str())
            .map(String::from),
        relevancy_score: Some(hit.similarity.clamp(0.0, 1.0)),
    };
    video.is_well_formed().then_some(video)
}
