// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response generation: multi-source synthesis, follow-up and chitchat
//! replies, and the transcript fallback summary.

use newsmith_core::{
    CallOptions, ConversationContext, ConversationExchange, GenerationRequest, NewsArticle,
    NewsmithError, UserPreferences, Video,
};

use crate::LlmAgents;

/// Articles included in a synthesis prompt.
pub const SUMMARY_ARTICLE_CAP: usize = 5;

/// Videos included in a synthesis prompt.
pub const SUMMARY_VIDEO_CAP: usize = 8;

/// Exchanges shown in the chitchat history window.
const CHITCHAT_HISTORY_WINDOW: usize = 5;

impl LlmAgents {
    /// Query-focused multi-source summary over the accepted articles and
    /// videos. Failure is fatal for the news branch.
    pub async fn summarize(
        &self,
        query: &str,
        articles: &[NewsArticle],
        videos: &[Video],
        opts: &CallOptions,
    ) -> Result<String, NewsmithError> {
        if articles.is_empty() && videos.is_empty() {
            return Ok("No news articles or videos were found for this query.".to_string());
        }
        let prompt = build_summary_prompt(query, articles, videos);
        let request = GenerationRequest::new(prompt)
            .with_system_role(
                "You are an expert multimedia news synthesizer for articles and video content",
            )
            .with_temperature(0.6)
            .with_max_tokens(4096);

        let response = self.generate(request, opts).await?;
        Ok(response.content)
    }

    /// Reply grounded in the recent exchanges and the referenced topic.
    /// Used by the follow-up branch; no retrieval is performed.
    pub async fn contextual_reply(
        &self,
        query: &str,
        recent_exchanges: &[ConversationExchange],
        referenced_topic: &str,
        preferences: &UserPreferences,
        last_summary: &str,
        opts: &CallOptions,
    ) -> Result<String, NewsmithError> {
        let prompt = build_contextual_prompt(
            query,
            recent_exchanges,
            referenced_topic,
            preferences,
            last_summary,
        );
        let request = GenerationRequest::new(prompt)
            .with_system_role(
                "You are a warm, knowledgeable AI news assistant continuing a conversation",
            )
            .with_temperature(0.7)
            .with_max_tokens(2048);

        let response = self.generate(request, opts).await?;
        Ok(response.content)
    }

    /// Open-domain reply conditioned on recent topics and a formatted
    /// history window, designed to demonstrate conversational memory.
    pub async fn chitchat_reply(
        &self,
        query: &str,
        conversation: &ConversationContext,
        opts: &CallOptions,
    ) -> Result<String, NewsmithError> {
        let prompt = build_chitchat_prompt(query, conversation);
        let request = GenerationRequest::new(prompt)
            .with_system_role("You are a friendly and knowledgeable AI news assistant")
            .with_temperature(0.9)
            .with_max_tokens(1024);

        let response = self.generate(request, opts).await?;
        Ok(response.content)
    }

    /// Short LLM summary standing in for a missing transcript. A long
    /// description is used directly; LLM failure also falls back to it.
    pub async fn fallback_video_summary(&self, video: &Video, opts: &CallOptions) -> String {
        if video.description.len() > 200 {
            return video.description.clone();
        }

        let prompt = format!(
            r#"Based on this video:
Title: {}
Channel: {}
Description: {}
Published: {}

Generate a short summary of what this video likely covers, focusing on the
main topics and information useful for news analysis."#,
            video.title,
            video.channel,
            video.description,
            video
                .published_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        );
        let request = GenerationRequest::new(prompt)
            .with_system_role("You are a highly accurate summary generator")
            .with_temperature(0.3)
            .with_max_tokens(200);

        match self.generate(request, opts).await {
            Ok(response) => response.content,
            Err(_) => video.description.clone(),
        }
    }
}

fn build_summary_prompt(query: &str, articles: &[NewsArticle], videos: &[Video]) -> String {
    let articles = &articles[..articles.len().min(SUMMARY_ARTICLE_CAP)];
    let videos = &videos[..videos.len().min(SUMMARY_VIDEO_CAP)];

    let mut sources = String::new();
    for (i, article) in articles.iter().enumerate() {
        sources.push_str(&format!(
            "ARTICLE {}:\nTitle: {}\nSource: {}\nDescription: {}\n",
            i + 1,
            article.title,
            article.source,
            article.description
        ));
        if !article.content.is_empty() {
            sources.push_str(&format!("Content: {}\n", article.content));
        }
        if let Some(published) = article.published_at {
            sources.push_str(&format!("Published: {}\n", published.format("%Y-%m-%d")));
        }
        sources.push('\n');
    }
    for (i, video) in videos.iter().enumerate() {
        sources.push_str(&format!(
            "VIDEO {}:\nTitle: {}\nChannel: {}\nDescription: {}\n",
            i + 1,
            video.title,
            video.channel,
            video.description
        ));
        if let Some(transcript) = video.transcript.as_deref() {
            sources.push_str(&format!("Transcript: {transcript}\n"));
        }
        if let Some(published) = video.published_at {
            sources.push_str(&format!("Published: {}\n", published.format("%Y-%m-%d")));
        }
        sources.push('\n');
    }

    format!(
        r#"Create a comprehensive, query-focused summary from the sources below.

USER QUERY: "{query}"
CURRENT DATE: {date}

SOURCES ({article_count} articles, {video_count} videos):
{sources}
Instructions:
1. Open with a direct answer to the user's question using the best
   available evidence.
2. Weave article analysis and video coverage together; attribute clearly
   ("according to news reports...", "video coverage shows...").
3. Include specific names, dates, numbers, and locations from the sources.
4. Present conflicting accounts transparently.
5. If the sources do not fully answer the query, state the limits and
   supplement carefully with clearly labelled background knowledge.

Structure: direct answer, key details, context and background, analysis."#,
        date = chrono::Utc::now().format("%Y-%m-%d"),
        article_count = articles.len(),
        video_count = videos.len(),
    )
}

fn build_contextual_prompt(
    query: &str,
    recent_exchanges: &[ConversationExchange],
    referenced_topic: &str,
    preferences: &UserPreferences,
    last_summary: &str,
) -> String {
    let previous = recent_exchanges
        .last()
        .map(|exchange| {
            format!(
                "PREVIOUS DISCUSSION:\nUser previously asked: \"{}\"\nPrevious response: \"{}\"\n",
                exchange.user_query, exchange.assistant_response
            )
        })
        .unwrap_or_default();

    let summary_section = if last_summary.is_empty() {
        String::new()
    } else {
        format!("LAST RESEARCH SUMMARY:\n{last_summary}\n")
    };

    format!(
        r#"The user is following up on a previous conversation.

{previous}REFERENCED TOPIC: "{referenced_topic}"
{summary_section}
CURRENT FOLLOW-UP QUERY: "{query}"

USER PREFERENCES:
- Personality: {personality}
- Favourite topics: {favourites}

Acknowledge what was discussed before, build on the previous response with
new depth or perspective, stay in the user's preferred voice, and keep the
flow of a continued conversation rather than a fresh topic."#,
        personality = preferences.news_personality,
        favourites = preferences.favourite_topics.join(", "),
    )
}

fn build_chitchat_prompt(query: &str, conversation: &ConversationContext) -> String {
    let mut history = String::new();
    let window = conversation.recent_exchanges(CHITCHAT_HISTORY_WINDOW);
    if window.is_empty() {
        history.push_str("This is our first conversation.\n");
    } else {
        history.push_str("CONVERSATION HISTORY:\n");
        for (i, exchange) in window.iter().enumerate() {
            history.push_str(&format!(
                "Exchange {}:\n  User: {}\n  Assistant: {}\n",
                i + 1,
                exchange.user_query,
                exchange.assistant_response
            ));
        }
    }

    format!(
        r#"You are a warm, witty AI news assistant with full conversational memory.
The user wants casual conversation rather than news right now.

CURRENT USER MESSAGE: "{query}"

Recent topics we've discussed: {topics}
Total messages so far: {count}

{history}
Instructions:
1. Use the conversation history above; reference specific details the user
   has shared (their name, preferences, earlier jokes).
2. If they ask about something they told you before, answer from the
   history verbatim (e.g. if they said "My name is John", answer "Your
   name is John").
3. Stay friendly, engaging, and conversational.

Respond with full memory of the conversation:"#,
        topics = conversation.current_topics.join(", "),
        count = conversation.message_count,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsmith_core::Intent;

    fn article(i: usize) -> NewsArticle {
        NewsArticle {
            id: format!("a{i}"),
            title: format!("Article {i}"),
            url: format!("https://example.com/{i}"),
            source: "Example".to_string(),
            author: None,
            published_at: None,
            description: "desc".to_string(),
            content: String::new(),
            image_url: String::new(),
            category: String::new(),
            relevance_score: None,
        }
    }

    #[test]
    fn summary_prompt_caps_articles_at_five() {
        let articles: Vec<NewsArticle> = (0..9).map(article).collect();
        let prompt = build_summary_prompt("q", &articles, &[]);
        assert!(prompt.contains("ARTICLE 5:"));
        assert!(!prompt.contains("ARTICLE 6:"));
        assert!(prompt.contains("5 articles"));
    }

    #[test]
    fn chitchat_prompt_limits_history_to_five() {
        let mut cc = ConversationContext::new("u", UserPreferences::default());
        for i in 0..8 {
            cc.add_exchange(&format!("q{i}"), "r", Intent::Chitchat, &[], &[], &[], 0);
        }
        let prompt = build_chitchat_prompt("hello", &cc);
        assert!(prompt.contains("q3"));
        assert!(prompt.contains("q7"));
        assert!(!prompt.contains("q2\n"));
    }

    #[test]
    fn chitchat_prompt_notes_first_conversation() {
        let cc = ConversationContext::new("u", UserPreferences::default());
        let prompt = build_chitchat_prompt("hi", &cc);
        assert!(prompt.contains("first conversation"));
    }

    #[test]
    fn contextual_prompt_carries_referenced_topic() {
        let mut cc = ConversationContext::new("u", UserPreferences::default());
        cc.add_exchange(
            "tesla earnings?",
            "Tesla reported...",
            Intent::NewNewsQuery,
            &[],
            &[],
            &[],
            0,
        );
        let prompt = build_contextual_prompt(
            "tell me more",
            cc.recent_exchanges(3),
            "Tesla Q3 earnings",
            &UserPreferences::default(),
            "",
        );
        assert!(prompt.contains("Tesla Q3 earnings"));
        assert!(prompt.contains("tesla earnings?"));
    }
}
