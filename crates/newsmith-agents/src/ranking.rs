// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM relevance ranking of fresh candidates.
//!
//! Candidates are submitted with their index as the id; the model returns a
//! strict JSON object whose entries are mapped back onto the original
//! items, so a hallucinated field never replaces real data. Selection
//! rules: score >= 0.6, at most [`MAX_RANKED_ITEMS`]; when nothing
//! qualifies, the top [`TOP_BY_SCORE_FALLBACK`] by score.

use newsmith_core::{CallOptions, GenerationRequest, NewsArticle, NewsmithError, Video};
use serde::Deserialize;

use crate::parse::strip_code_fences;
use crate::LlmAgents;

/// Relevance threshold below which an item is discarded.
pub const RELEVANCE_THRESHOLD: f32 = 0.6;

/// Maximum items returned by a ranking pass.
pub const MAX_RANKED_ITEMS: usize = 8;

/// Items kept when no candidate clears the threshold.
pub const TOP_BY_SCORE_FALLBACK: usize = 3;

/// Candidate cap applied before prompt construction, for prompt size.
const PROMPT_CANDIDATE_CAP: usize = 20;

#[derive(Debug, Deserialize)]
struct RankedEntry {
    id: usize,
    #[serde(default)]
    relevance_score: f32,
}

#[derive(Debug, Deserialize)]
struct ArticleRanking {
    #[serde(default)]
    relevant_articles: Vec<RankedEntry>,
}

#[derive(Debug, Deserialize)]
struct VideoRanking {
    #[serde(default)]
    relevant_videos: Vec<RankedEntry>,
}

impl LlmAgents {
    /// Ranks fresh articles against the query. Parse or transport failure
    /// is surfaced so the caller can fall back to semantic neighbours.
    pub async fn rank_articles(
        &self,
        candidates: &[NewsArticle],
        query: &str,
        keywords: &[String],
        opts: &CallOptions,
    ) -> Result<Vec<NewsArticle>, NewsmithError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let capped = &candidates[..candidates.len().min(PROMPT_CANDIDATE_CAP)];
        let prompt = build_article_ranking_prompt(capped, query, keywords);
        let request = GenerationRequest::new(prompt)
            .with_system_role(
                "You are an expert news relevancy evaluator. Return only the requested JSON.",
            )
            .with_temperature(0.3)
            .with_max_tokens(4096)
            .expect_json();

        let response = self.generate(request, opts).await?;
        let ranking: ArticleRanking = serde_json::from_str(strip_code_fences(&response.content))
            .map_err(|e| {
                NewsmithError::agent("relevancy", "article ranking JSON did not decode")
                    .with_cause(e)
            })?;

        Ok(select_ranked(capped, &ranking.relevant_articles, |article, score| {
            let mut article = article.clone();
            article.relevance_score = Some(score);
            article
        }))
    }

    /// Ranks fresh videos against the query. Same contract as
    /// [`LlmAgents::rank_articles`].
    pub async fn rank_videos(
        &self,
        candidates: &[Video],
        query: &str,
        keywords: &[String],
        opts: &CallOptions,
    ) -> Result<Vec<Video>, NewsmithError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let capped = &candidates[..candidates.len().min(PROMPT_CANDIDATE_CAP)];
        let prompt = build_video_ranking_prompt(capped, query, keywords);
        let request = GenerationRequest::new(prompt)
            .with_system_role(
                "You are an expert video relevancy evaluator. Return only the requested JSON.",
            )
            .with_temperature(0.3)
            .with_max_tokens(4096)
            .expect_json();

        let response = self.generate(request, opts).await?;
        let ranking: VideoRanking = serde_json::from_str(strip_code_fences(&response.content))
            .map_err(|e| {
                NewsmithError::agent("relevancy", "video ranking JSON did not decode").with_cause(e)
            })?;

        Ok(select_ranked(capped, &ranking.relevant_videos, |video, score| {
            let mut video = video.clone();
            video.relevancy_score = Some(score);
            video
        }))
    }
}

/// Applies the selection rules to parsed entries: clamp scores, drop ids
/// outside the candidate range, threshold at 0.6 with an 8-item cap, and
/// top-3-by-score when nothing qualifies.
fn select_ranked<T, F, O>(candidates: &[T], entries: &[RankedEntry], assign: F) -> Vec<O>
where
    F: Fn(&T, f32) -> O,
{
    let mut scored: Vec<(usize, f32)> = entries
        .iter()
        .filter(|entry| entry.id < candidates.len())
        .map(|entry| (entry.id, entry.relevance_score.clamp(0.0, 1.0)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let mut seen = std::collections::HashSet::new();
    scored.retain(|(id, _)| seen.insert(*id));

    let qualifying: Vec<&(usize, f32)> = scored
        .iter()
        .filter(|(_, score)| *score >= RELEVANCE_THRESHOLD)
        .collect();

    let selected: Vec<(usize, f32)> = if qualifying.is_empty() {
        scored.iter().take(TOP_BY_SCORE_FALLBACK).copied().collect()
    } else {
        qualifying
            .into_iter()
            .take(MAX_RANKED_ITEMS)
            .copied()
            .collect()
    };

    selected
        .into_iter()
        .map(|(id, score)| assign(&candidates[id], score))
        .collect()
}

fn build_article_ranking_prompt(
    articles: &[NewsArticle],
    query: &str,
    keywords: &[String],
) -> String {
    let mut listing = String::new();
    for (i, article) in articles.iter().enumerate() {
        listing.push_str(&format!(
            "ARTICLE {i}:\n- Title: {}\n- Source: {}\n- Published: {}\n- Description: {}\n\n",
            article.title,
            article.source,
            article
                .published_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string()),
            article.description,
        ));
    }

    format!(
        r#"Evaluate how well each article addresses the user's news query.

USER QUERY: "{query}"
KEYWORDS: {keywords}

{listing}
Criteria: direct factual relevance to the query, recency, credibility, and
completeness. Penalize opinion pieces and tangential matches.

Scoring scale (0.0-1.0): 0.90+ excellent, 0.70-0.89 good, 0.50-0.69
moderate, below 0.50 irrelevant.

Rules:
- Include only articles with relevance_score >= {threshold}.
- If none qualify, return the top {fallback} by score.
- At most {cap} articles, sorted by relevance_score descending.
- Use the exact id numbers from the input.

Return only this JSON object:
{{
  "relevant_articles": [
    {{"id": 0, "relevance_score": 0.95}}
  ],
  "evaluation_summary": {{"total_evaluated": {total}, "threshold_used": {threshold}}}
}}"#,
        keywords = keywords.join(", "),
        threshold = RELEVANCE_THRESHOLD,
        fallback = TOP_BY_SCORE_FALLBACK,
        cap = MAX_RANKED_ITEMS,
        total = articles.len(),
    )
}

fn build_video_ranking_prompt(videos: &[Video], query: &str, keywords: &[String]) -> String {
    let mut listing = String::new();
    for (i, video) in videos.iter().enumerate() {
        // Prefer transcript content; trim for prompt size.
        let (label, content) = match video.transcript.as_deref() {
            Some(t) if t.trim().len() > 50 => ("Transcript", trim_words(t, 500)),
            _ => ("Description", video.description.clone()),
        };
        listing.push_str(&format!(
            "VIDEO {i}:\n- Title: {}\n- Channel: {}\n- Published: {}\n- {label}: {content}\n\n",
            video.title,
            video.channel,
            video
                .published_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string()),
        ));
    }

    format!(
        r#"Evaluate how well each video addresses the user's news query.

USER QUERY: "{query}"
KEYWORDS: {keywords}

{listing}
Criteria: transcript content relevance and depth (most important), title
and description relevance, freshness, and channel credibility for news.
Prefer videos with rich transcript coverage over description-only videos.

Rules:
- Include only videos with relevance_score >= {threshold}.
- If none qualify, return the top {fallback} by score.
- At most {cap} videos, sorted by relevance_score descending.
- Use the exact id numbers from the input.

Return only this JSON object:
{{
  "relevant_videos": [
    {{"id": 0, "relevance_score": 0.85}}
  ],
  "evaluation_summary": {{"total_evaluated": {total}, "threshold_used": {threshold}}}
}}"#,
        keywords = keywords.join(", "),
        threshold = RELEVANCE_THRESHOLD,
        fallback = TOP_BY_SCORE_FALLBACK,
        cap = MAX_RANKED_ITEMS,
        total = videos.len(),
    )
}

fn trim_words(text: &str, cap: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= cap {
        return text.to_string();
    }
    let mut trimmed = words[..cap].join(" ");
    trimmed.push_str("...");
    trimmed
}
