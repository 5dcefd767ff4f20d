// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The news branch: query processing, retrieval fan-out, embedding
//! fan-out, vector-store write, relevance ranking, scrape enrichment,
//! synthesis, and personality stylization.
//!
//! Fan-out tasks return their results and are merged at the join point;
//! the workflow context is only mutated by the owning executor between
//! suspension points.

use std::time::Duration;

use newsmith_agents::IntentClassification;
use newsmith_core::{AgentStatus, CallOptions, NewsArticle, NewsmithError, Video, WorkflowContext};
use tracing::{debug, warn};

use crate::embedding::embed_batch;
use crate::executor::{StageTimer, WorkflowExecutor};

/// Fresh-article fallback size when both ranking paths come up empty.
const FRESH_FALLBACK_COUNT: usize = 5;

/// Relevance assigned to fresh-fallback articles.
const FRESH_FALLBACK_SCORE: f32 = 0.5;

impl WorkflowExecutor {
    pub(crate) async fn run_news_branch(
        &self,
        context: &mut WorkflowContext,
        classification: &IntentClassification,
    ) -> Result<(), NewsmithError> {
        self.query_processing(context, classification).await?;
        self.sync_snapshot(context);
        self.retrieval_fan_out(context).await?;
        self.embedding_fan_out(context).await?;
        self.vector_storage(context).await?;
        self.sync_snapshot(context);
        self.relevance_ranking(context).await?;
        self.scrape_enrichment(context).await;
        self.sync_snapshot(context);
        self.synthesize(context).await?;
        self.stylize(context).await?;
        self.sync_snapshot(context);
        Ok(())
    }

    /// Sequential query processing: expansion (recoverable) then keyword
    /// extraction (fatal).
    async fn query_processing(
        &self,
        context: &mut WorkflowContext,
        classification: &IntentClassification,
    ) -> Result<(), NewsmithError> {
        self.check_cancelled(context)?;

        // Expansion starts from the classifier's rewrite when present.
        let base_query = classification
            .enhanced_query
            .clone()
            .unwrap_or_else(|| context.original_query.clone());

        let timer = StageTimer::start("query_enhancer");
        self.emitter
            .stage(
                context,
                "query_enhancer",
                AgentStatus::Processing,
                "Enhancing query with conversation context",
                &self.opts,
            )
            .await;

        let stage_opts = self.stage_opts("query_enhancer");
        match self
            .ports
            .llm
            .enhance_query(&base_query, &context.conversation, &stage_opts)
            .await
        {
            Ok(enhanced) => {
                context.processing_stats.api_calls += 1;
                context.metadata.insert(
                    "enhanced_query".to_string(),
                    serde_json::Value::String(enhanced.clone()),
                );
                let message = format!("Enhanced query: {enhanced}");
                context.set_enhanced_query(enhanced);
                timer.finish(context, AgentStatus::Completed);
                self.emitter
                    .stage(
                        context,
                        "query_enhancer",
                        AgentStatus::Completed,
                        message,
                        &self.opts,
                    )
                    .await;
            }
            Err(err) if err.is_cancellation() => return Err(err),
            Err(err) => {
                warn!(workflow_id = context.id.as_str(), error = %err, "query enhancement failed, using original query");
                timer.finish(context, AgentStatus::Failed);
                self.emitter
                    .stage(
                        context,
                        "query_enhancer",
                        AgentStatus::Failed,
                        "Query enhancement failed, using original query",
                        &self.opts,
                    )
                    .await;
            }
        }

        self.check_cancelled(context)?;
        let timer = StageTimer::start("keyword_extractor");
        self.emitter
            .stage(
                context,
                "keyword_extractor",
                AgentStatus::Processing,
                "Extracting keywords from enhanced query",
                &self.opts,
            )
            .await;

        let query = context.effective_query().to_string();
        let stage_opts = self.stage_opts("keyword_extractor");
        match self
            .ports
            .llm
            .extract_keywords(&query, &context.conversation, &stage_opts)
            .await
        {
            Ok(keywords) => {
                context.add_keywords(&keywords);
                context.processing_stats.api_calls += 1;
                let message = format!("Extracted {} keywords from enhanced query", keywords.len());
                timer.finish(context, AgentStatus::Completed);
                self.emitter
                    .stage(
                        context,
                        "keyword_extractor",
                        AgentStatus::Completed,
                        message,
                        &self.opts,
                    )
                    .await;
                Ok(())
            }
            Err(err) => {
                timer.finish(context, AgentStatus::Failed);
                self.emitter
                    .stage(
                        context,
                        "keyword_extractor",
                        AgentStatus::Failed,
                        "Keyword extraction failed",
                        &self.opts,
                    )
                    .await;
                Err(err)
            }
        }
    }

    /// Parallel news + video retrieval. Both tasks reach a decision before
    /// the join. A news task with zero articles fails the pipeline; a
    /// video task with zero videos degrades to articles-only.
    async fn retrieval_fan_out(
        &self,
        context: &mut WorkflowContext,
    ) -> Result<(), NewsmithError> {
        self.check_cancelled(context)?;
        let timer = StageTimer::start("news_fetch");
        self.emitter
            .stage(
                context,
                "news_fetch",
                AgentStatus::Processing,
                "Fetching fresh news articles and videos",
                &self.opts,
            )
            .await;

        let keywords = context.keywords.clone();
        let query = context.effective_query().to_string();
        let retrieval = &self.config.retrieval;
        let news_opts = self.stage_opts("news_fetch");
        let video_opts = self.stage_opts("video_fetch");

        let news_task = async {
            let mut articles: Vec<NewsArticle> = Vec::new();
            let mut error: Option<NewsmithError> = None;

            if !keywords.is_empty() {
                match self
                    .ports
                    .news
                    .search_keywords(&keywords, retrieval.news_page_size, &news_opts)
                    .await
                {
                    Ok(found) => articles = found,
                    Err(err) => {
                        warn!(error = %err, "keyword news search failed, trying recent news");
                        error = Some(err);
                    }
                }
            }

            if articles.is_empty() {
                match self
                    .ports
                    .news
                    .search_recent(&query, retrieval.recent_hours, retrieval.recent_max, &news_opts)
                    .await
                {
                    Ok(found) => {
                        articles = found;
                        if !articles.is_empty() {
                            error = None;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "recent news search failed");
                        error = Some(err);
                    }
                }
            }

            (articles, error)
        };

        let video_task = async {
            let mut videos: Vec<Video> = Vec::new();
            let mut error: Option<NewsmithError> = None;

            if !keywords.is_empty() {
                match self
                    .ports
                    .videos
                    .search_keywords(&keywords, retrieval.video_max, &video_opts)
                    .await
                {
                    Ok(found) => videos = found,
                    Err(err) => {
                        warn!(error = %err, "video keyword search failed, trying query search");
                        error = Some(err);
                    }
                }
            }

            if videos.is_empty() {
                match self
                    .ports
                    .videos
                    .search_query(&query, retrieval.video_max, &video_opts)
                    .await
                {
                    Ok(found) => {
                        videos = found;
                        error = None;
                    }
                    Err(err) => {
                        warn!(error = %err, "video query search failed, continuing without videos");
                        error = Some(err);
                    }
                }
            }

            videos.truncate(retrieval.video_max);
            let transcripts = self.enrich_video_transcripts(&mut videos, &video_opts).await;
            (videos, error, transcripts)
        };

        let ((articles, news_error), (videos, video_error, transcripts)) =
            tokio::join!(news_task, video_task);

        if self.opts.is_cancelled() {
            return Err(NewsmithError::cancelled(&context.id));
        }

        let articles: Vec<NewsArticle> = articles
            .into_iter()
            .filter(NewsArticle::is_well_formed)
            .collect();
        let videos: Vec<Video> = videos.into_iter().filter(Video::is_well_formed).collect();

        if articles.is_empty() {
            timer.finish(context, AgentStatus::Failed);
            self.emitter
                .stage(
                    context,
                    "news_fetch",
                    AgentStatus::Failed,
                    "News search returned no articles",
                    &self.opts,
                )
                .await;
            let mut err = NewsmithError::external(
                "NEWS_SEARCH_FAILED",
                "news search returned no articles",
            );
            if let Some(cause) = news_error {
                err = err.with_cause(cause);
            }
            return Err(err);
        }

        context.processing_stats.articles_found = articles.len();
        context.processing_stats.videos_found = videos.len();
        context.articles = articles.clone();
        context.videos = videos.clone();
        context.artifacts.fresh_articles = articles;
        context.artifacts.fresh_videos = videos;
        context.metadata.insert(
            "articles_count".to_string(),
            serde_json::Value::from(context.articles.len()),
        );
        context.metadata.insert(
            "videos_count".to_string(),
            serde_json::Value::from(context.videos.len()),
        );

        let message = format!(
            "Fetched {} fresh articles and {} videos",
            context.articles.len(),
            context.videos.len()
        );
        timer.finish(context, AgentStatus::Completed);
        self.emitter
            .stage(context, "news_fetch", AgentStatus::Completed, message, &self.opts)
            .await;

        let video_timer = StageTimer::start("video_fetch");
        self.emitter
            .stage(
                context,
                "video_fetch",
                AgentStatus::Processing,
                "Enriching videos with transcripts",
                &self.opts,
            )
            .await;
        if context.videos.is_empty() && video_error.is_some() {
            video_timer.finish(context, AgentStatus::Failed);
            self.emitter
                .stage(
                    context,
                    "video_fetch",
                    AgentStatus::Failed,
                    "Video search failed, continuing with articles only",
                    &self.opts,
                )
                .await;
        } else {
            let message = format!(
                "Enriched {} videos ({} with transcripts, {} with fallback)",
                context.videos.len(),
                transcripts,
                context.videos.len().saturating_sub(transcripts)
            );
            video_timer.finish(context, AgentStatus::Completed);
            self.emitter
                .stage(
                    context,
                    "video_fetch",
                    AgentStatus::Completed,
                    message,
                    &self.opts,
                )
                .await;
        }

        Ok(())
    }

    /// Sequential transcript enrichment. Returns how many videos got a
    /// real transcript (the rest carry an LLM fallback summary).
    async fn enrich_video_transcripts(&self, videos: &mut [Video], opts: &CallOptions) -> usize {
        let word_cap = self.config.retrieval.transcript_word_cap;
        let mut fetched = 0usize;

        for video in videos.iter_mut() {
            if opts.is_cancelled() {
                break;
            }
            match self.ports.videos.get_transcript(&video.id, opts).await {
                Ok(transcript) => {
                    fetched += 1;
                    video.transcript = Some(trim_to_words(&transcript, word_cap));
                }
                Err(err) => {
                    debug!(video_id = video.id.as_str(), error = %err, "transcript fetch failed, generating fallback summary");
                    let fallback = self.ports.llm.fallback_video_summary(video, opts).await;
                    video.transcript = Some(fallback);
                }
            }
        }
        fetched
    }

    /// Embedding fan-out: query, article, and video embedding sets.
    /// Article failures are fatal; video failures drop videos from the
    /// vector write and semantic retrieval but keep them in context.
    async fn embedding_fan_out(
        &self,
        context: &mut WorkflowContext,
    ) -> Result<(), NewsmithError> {
        self.check_cancelled(context)?;
        let timer = StageTimer::start("embedding_generation");
        self.emitter
            .stage(
                context,
                "embedding_generation",
                AgentStatus::Processing,
                "Generating embeddings for query, articles, and videos",
                &self.opts,
            )
            .await;

        let embedding_config = &self.config.embedding;
        let query_text = vec![context.effective_query().to_string()];
        let article_texts: Vec<String> = context
            .artifacts
            .fresh_articles
            .iter()
            .map(|a| format!("{} - {}", a.title, a.description))
            .collect();
        let video_texts: Vec<String> = context
            .artifacts
            .fresh_videos
            .iter()
            .map(|v| format!("{} - {}", v.title, v.description))
            .collect();

        let stage_opts = self.stage_opts("embedding_generation");
        let (query_result, article_result, video_result) = tokio::join!(
            embed_batch(
                self.ports.embeddings.clone(),
                &query_text,
                embedding_config,
                &stage_opts
            ),
            embed_batch(
                self.ports.embeddings.clone(),
                &article_texts,
                embedding_config,
                &stage_opts
            ),
            embed_batch(
                self.ports.embeddings.clone(),
                &video_texts,
                embedding_config,
                &stage_opts
            ),
        );

        let query_embedding = match query_result {
            Ok(mut vectors) => vectors.pop().ok_or_else(|| {
                NewsmithError::internal("EMBEDDING_EMPTY", "query embedding set was empty")
            })?,
            Err(err) => {
                timer.finish(context, AgentStatus::Failed);
                self.emitter
                    .stage(
                        context,
                        "embedding_generation",
                        AgentStatus::Failed,
                        "Query embedding generation failed",
                        &self.opts,
                    )
                    .await;
                return Err(err);
            }
        };

        let article_embeddings = match article_result {
            Ok(vectors) => vectors,
            Err(err) => {
                timer.finish(context, AgentStatus::Failed);
                self.emitter
                    .stage(
                        context,
                        "embedding_generation",
                        AgentStatus::Failed,
                        "Article embedding generation failed",
                        &self.opts,
                    )
                    .await;
                return Err(err);
            }
        };

        let video_embeddings = match video_result {
            Ok(vectors) => vectors,
            Err(err) if err.is_cancellation() => return Err(err),
            Err(err) => {
                warn!(workflow_id = context.id.as_str(), error = %err, "video embedding generation failed, dropping videos from vector storage");
                Vec::new()
            }
        };

        context.processing_stats.embeddings_count =
            article_embeddings.len() + video_embeddings.len() + 1;
        let message = format!(
            "Generated embeddings for {} articles and {} videos",
            article_embeddings.len(),
            video_embeddings.len()
        );
        context.artifacts.query_embedding = Some(query_embedding);
        context.artifacts.article_embeddings = article_embeddings;
        context.artifacts.video_embeddings = video_embeddings;

        timer.finish(context, AgentStatus::Completed);
        self.emitter
            .stage(
                context,
                "embedding_generation",
                AgentStatus::Completed,
                message,
                &self.opts,
            )
            .await;
        Ok(())
    }

    /// Writes fresh articles and videos to their collections in parallel.
    /// The articles write is fatal on failure; the videos write is not.
    async fn vector_storage(&self, context: &mut WorkflowContext) -> Result<(), NewsmithError> {
        self.check_cancelled(context)?;
        let timer = StageTimer::start("vector_storage");
        self.emitter
            .stage(
                context,
                "vector_storage",
                AgentStatus::Processing,
                "Storing fresh articles and videos in the vector store",
                &self.opts,
            )
            .await;

        let articles = &context.artifacts.fresh_articles;
        let article_embeddings = &context.artifacts.article_embeddings;
        let videos = &context.artifacts.fresh_videos;
        let video_embeddings = &context.artifacts.video_embeddings;

        let stage_opts = self.stage_opts("vector_storage");
        let article_write = self
            .ports
            .vectors
            .store_articles(articles, article_embeddings, &stage_opts);
        let video_write = async {
            if videos.is_empty() || video_embeddings.is_empty() {
                return Ok(0usize);
            }
            self.ports
                .vectors
                .store_videos(videos, video_embeddings, &stage_opts)
                .await
        };

        let (article_result, video_result) = tokio::join!(article_write, video_write);

        let stored_articles = match article_result {
            Ok(count) => count,
            Err(err) => {
                timer.finish(context, AgentStatus::Failed);
                self.emitter
                    .stage(
                        context,
                        "vector_storage",
                        AgentStatus::Failed,
                        "Failed to store fresh articles in the vector store",
                        &self.opts,
                    )
                    .await;
                return Err(err);
            }
        };

        let stored_videos = match video_result {
            Ok(count) => count,
            Err(err) if err.is_cancellation() => return Err(err),
            Err(err) => {
                warn!(workflow_id = context.id.as_str(), error = %err, "video vector write failed, continuing with articles only");
                0
            }
        };

        context.artifacts.stored_articles = stored_articles;
        context.artifacts.stored_videos = stored_videos;

        let message = if stored_videos > 0 {
            format!("Stored {stored_articles} articles and {stored_videos} videos")
        } else {
            format!("Stored {stored_articles} articles")
        };
        timer.finish(context, AgentStatus::Completed);
        self.emitter
            .stage(
                context,
                "vector_storage",
                AgentStatus::Completed,
                message,
                &self.opts,
            )
            .await;
        Ok(())
    }

    /// Relevance ranking with the full fallback cascade.
    ///
    /// Semantic neighbours are fetched first (two parallel vector queries)
    /// and serve both as candidates and as the LLM fallback. Articles:
    /// LLM -> semantic -> top-5 fresh at 0.5. Videos: LLM -> semantic ->
    /// drop.
    async fn relevance_ranking(
        &self,
        context: &mut WorkflowContext,
    ) -> Result<(), NewsmithError> {
        self.check_cancelled(context)?;
        let timer = StageTimer::start("relevancy");
        self.emitter
            .stage(
                context,
                "relevancy",
                AgentStatus::Processing,
                "Ranking articles and videos by relevance",
                &self.opts,
            )
            .await;

        let query_embedding = context.artifacts.query_embedding.clone().ok_or_else(|| {
            NewsmithError::internal("QUERY_EMBEDDING_MISSING", "query embedding not generated")
        })?;
        let vector_config = &self.config.vector;
        let stage_opts = self.stage_opts("relevancy");

        let semantic_articles_task = self.ports.vectors.similar_articles(
            &query_embedding,
            vector_config.article_top_k,
            None,
            &stage_opts,
        );
        let semantic_videos_task = async {
            if context.artifacts.video_embeddings.is_empty() {
                return Vec::new();
            }
            match self
                .ports
                .vectors
                .similar_videos(&query_embedding, vector_config.video_top_k, None, &stage_opts)
                .await
            {
                Ok(videos) => videos,
                Err(err) => {
                    warn!(error = %err, "video semantic search failed, continuing with articles only");
                    Vec::new()
                }
            }
        };

        let (semantic_articles_result, semantic_videos) =
            tokio::join!(semantic_articles_task, semantic_videos_task);
        let semantic_articles = match semantic_articles_result {
            Ok(articles) => articles,
            Err(err) if err.is_cancellation() => return Err(err),
            Err(err) => {
                warn!(error = %err, "article semantic search failed, relying on LLM ranking");
                Vec::new()
            }
        };
        context.artifacts.semantic_articles = semantic_articles.clone();
        context.artifacts.semantic_videos = semantic_videos.clone();

        let query = context.effective_query().to_string();
        let keywords = context.keywords.clone();

        let article_rank_task = self.ports.llm.rank_articles(
            &context.artifacts.fresh_articles,
            &query,
            &keywords,
            &stage_opts,
        );
        let video_rank_task = async {
            if context.videos.is_empty() {
                return Ok(Vec::new());
            }
            self.ports
                .llm
                .rank_videos(&context.videos, &query, &keywords, &stage_opts)
                .await
        };
        let (article_rank, video_rank) = tokio::join!(article_rank_task, video_rank_task);
        context.processing_stats.api_calls += 1;

        let relevant_articles = match article_rank {
            Ok(ranked) if !ranked.is_empty() => ranked,
            Ok(_) | Err(_) if self.opts.is_cancelled() => {
                return Err(NewsmithError::cancelled(&context.id))
            }
            other => {
                if let Err(err) = &other {
                    warn!(error = %err, "LLM article ranking failed, using semantic results");
                }
                if !semantic_articles.is_empty() {
                    semantic_articles
                } else {
                    // Last resort: the freshest articles at a neutral score.
                    context
                        .artifacts
                        .fresh_articles
                        .iter()
                        .take(FRESH_FALLBACK_COUNT)
                        .cloned()
                        .map(|mut article| {
                            article.relevance_score = Some(FRESH_FALLBACK_SCORE);
                            article
                        })
                        .collect()
                }
            }
        };

        let relevant_videos = match video_rank {
            Ok(ranked) if !ranked.is_empty() => ranked,
            _ if self.opts.is_cancelled() => return Err(NewsmithError::cancelled(&context.id)),
            other => {
                if let Err(err) = &other {
                    warn!(error = %err, "LLM video ranking failed, keeping semantically similar videos");
                }
                semantic_videos
            }
        };

        context.processing_stats.articles_filtered = relevant_articles.len();
        context.processing_stats.videos_filtered = relevant_videos.len();
        context.articles = relevant_articles;
        context.videos = relevant_videos;

        let with_transcripts = context.videos.iter().filter(|v| v.has_transcript()).count();
        let message = format!(
            "Selected {} relevant articles and {} relevant videos ({} with transcripts)",
            context.articles.len(),
            context.videos.len(),
            with_transcripts
        );
        timer.finish(context, AgentStatus::Completed);
        self.emitter
            .stage(
                context,
                "relevancy",
                AgentStatus::Completed,
                message,
                &self.opts,
            )
            .await;
        Ok(())
    }

    /// Optional scrape enrichment. Never fails the pipeline; articles keep
    /// their existing content when scraping fails.
    async fn scrape_enrichment(&self, context: &mut WorkflowContext) {
        if self.opts.is_cancelled() {
            return;
        }
        let timer = StageTimer::start("scraper");
        self.emitter
            .stage(
                context,
                "scraper",
                AgentStatus::Processing,
                "Fetching full article content",
                &self.opts,
            )
            .await;

        if context.articles.is_empty() {
            timer.finish(context, AgentStatus::Completed);
            self.emitter
                .stage(
                    context,
                    "scraper",
                    AgentStatus::Completed,
                    "No articles to scrape",
                    &self.opts,
                )
                .await;
            return;
        }

        let scraper_config = &self.config.scraper;
        let per_url_timeout = Duration::from_secs(scraper_config.timeout_secs);
        let urls: Vec<String> = context.articles.iter().map(|a| a.url.clone()).collect();
        let stage_opts = self.stage_opts("scraper");

        match self
            .ports
            .scraper
            .scrape_many(
                &urls,
                scraper_config.concurrency,
                per_url_timeout,
                scraper_config.retries,
                &stage_opts,
            )
            .await
        {
            Ok(outcome) => {
                for page in &outcome.ok {
                    if !page.success || page.content.is_empty() {
                        continue;
                    }
                    if let Some(article) =
                        context.articles.iter_mut().find(|a| a.url == page.url)
                    {
                        article.content = page.content.clone();
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "batch scraping failed, retrying articles individually");
                for index in 0..context.articles.len() {
                    if self.opts.is_cancelled() {
                        break;
                    }
                    let url = context.articles[index].url.clone();
                    match self.ports.scraper.scrape(&url, per_url_timeout, &stage_opts).await {
                        Ok(page) if page.success && !page.content.is_empty() => {
                            context.articles[index].content = page.content;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            debug!(url = url.as_str(), error = %err, "individual scrape failed, keeping existing content");
                        }
                    }
                }
            }
        }

        let enriched = context
            .articles
            .iter()
            .filter(|a| !a.content.is_empty())
            .count();
        let message = format!(
            "Enhanced {enriched} articles with full content (attempted {})",
            context.articles.len()
        );
        timer.finish(context, AgentStatus::Completed);
        self.emitter
            .stage(
                context,
                "scraper",
                AgentStatus::Completed,
                message,
                &self.opts,
            )
            .await;
    }

    /// Multi-source synthesis. Fatal on failure.
    async fn synthesize(&self, context: &mut WorkflowContext) -> Result<(), NewsmithError> {
        self.check_cancelled(context)?;
        let timer = StageTimer::start("summarizer");
        self.emitter
            .stage(
                context,
                "summarizer",
                AgentStatus::Processing,
                "Generating comprehensive summary from articles and videos",
                &self.opts,
            )
            .await;

        let stage_opts = self.stage_opts("summarizer");
        let result = self
            .ports
            .llm
            .summarize(
                &context.original_query,
                &context.articles,
                &context.videos,
                &stage_opts,
            )
            .await;

        match result {
            Ok(summary) => {
                context.processing_stats.api_calls += 1;
                context.processing_stats.articles_summarized = context.articles.len();
                context.processing_stats.videos_summarized = context.videos.len();
                context.conversation.last_summary = summary.clone();
                let message = if context.videos.is_empty() {
                    format!(
                        "Generated summary from {} articles ({} chars)",
                        context.articles.len(),
                        summary.len()
                    )
                } else {
                    format!(
                        "Generated summary from {} articles and {} videos ({} chars)",
                        context.articles.len(),
                        context.videos.len(),
                        summary.len()
                    )
                };
                context.summary = Some(summary);
                timer.finish(context, AgentStatus::Completed);
                self.emitter
                    .stage(
                        context,
                        "summarizer",
                        AgentStatus::Completed,
                        message,
                        &self.opts,
                    )
                    .await;
                Ok(())
            }
            Err(err) => {
                timer.finish(context, AgentStatus::Failed);
                self.emitter
                    .stage(
                        context,
                        "summarizer",
                        AgentStatus::Failed,
                        "Summary generation failed",
                        &self.opts,
                    )
                    .await;
                Err(err)
            }
        }
    }

    /// Optional personality stylization; the unstyled summary is the
    /// response when this fails.
    async fn stylize(&self, context: &mut WorkflowContext) -> Result<(), NewsmithError> {
        self.check_cancelled(context)?;
        let timer = StageTimer::start("persona");
        self.emitter
            .stage(
                context,
                "persona",
                AgentStatus::Processing,
                "Personalizing response",
                &self.opts,
            )
            .await;

        let summary = context.summary.clone().unwrap_or_default();
        let personality = context.conversation.user_preferences.news_personality.clone();
        let stage_opts = self.stage_opts("persona");

        match self
            .ports
            .llm
            .stylize(&context.original_query, &summary, &personality, &stage_opts)
            .await
        {
            Ok(styled) => {
                context.processing_stats.api_calls += 1;
                context.response = Some(styled);
                let shown = if personality.is_empty() {
                    newsmith_agents::persona::DEFAULT_PERSONALITY
                } else {
                    personality.as_str()
                };
                let message = format!("Applied {shown} personality");
                timer.finish(context, AgentStatus::Completed);
                self.emitter
                    .stage(
                        context,
                        "persona",
                        AgentStatus::Completed,
                        message,
                        &self.opts,
                    )
                    .await;
            }
            Err(err) if err.is_cancellation() => return Err(err),
            Err(err) => {
                warn!(workflow_id = context.id.as_str(), error = %err, "personality application failed, using base summary");
                context.response = Some(summary);
                timer.finish(context, AgentStatus::Failed);
                self.emitter
                    .stage(
                        context,
                        "persona",
                        AgentStatus::Failed,
                        "Personality application failed, using base summary",
                        &self.opts,
                    )
                    .await;
            }
        }
        Ok(())
    }
}

/// Trims text to at most `cap` words, appending an ellipsis when cut.
fn trim_to_words(text: &str, cap: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= cap {
        return text.to_string();
    }
    let mut trimmed = words[..cap].join(" ");
    trimmed.push_str("...");
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_to_words_caps_long_transcripts() {
        let text = (0..3000).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let trimmed = trim_to_words(&text, 2500);
        assert_eq!(trimmed.split_whitespace().count(), 2500);
        assert!(trimmed.ends_with("..."));
    }

    #[test]
    fn trim_to_words_leaves_short_text_alone() {
        assert_eq!(trim_to_words("short transcript", 2500), "short transcript");
    }
}
