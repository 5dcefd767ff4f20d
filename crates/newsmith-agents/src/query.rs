// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query processing operations: expansion and keyword extraction.
//!
//! Both run in strict sequence on the news branch. Expansion failures are
//! recoverable (the original query is used); keyword extraction failures
//! are fatal for the branch.

use newsmith_core::{CallOptions, ConversationContext, GenerationRequest, NewsmithError};

use crate::parse::{parse_enhanced_query, parse_keywords};
use crate::LlmAgents;

impl LlmAgents {
    /// Rewrites a query into a compact 2-3 keyword form optimized for
    /// AND-joined retrieval. Returns the original query when the model
    /// produces no usable rewrite.
    pub async fn enhance_query(
        &self,
        query: &str,
        conversation: &ConversationContext,
        opts: &CallOptions,
    ) -> Result<String, NewsmithError> {
        let prompt = build_expansion_prompt(query, conversation);
        let request = GenerationRequest::new(prompt)
            .with_system_role(
                "You are an expert query expansion specialist for news keyword retrieval",
            )
            .with_temperature(0.3)
            .with_max_tokens(512);

        let response = self.generate(request, opts).await?;
        Ok(parse_enhanced_query(&response.content).unwrap_or_else(|| query.to_string()))
    }

    /// Extracts a de-duplicated, ordered keyword list from the enhanced
    /// query. An empty result is an error: the news branch cannot proceed
    /// without keywords or a usable query.
    pub async fn extract_keywords(
        &self,
        query: &str,
        conversation: &ConversationContext,
        opts: &CallOptions,
    ) -> Result<Vec<String>, NewsmithError> {
        let prompt = build_keyword_prompt(query, conversation);
        let request = GenerationRequest::new(prompt)
            .with_system_role("You are an expert keyword extractor for news search queries")
            .with_temperature(0.2)
            .with_max_tokens(300);

        let response = self.generate(request, opts).await?;
        let keywords = parse_keywords(&response.content);
        if keywords.is_empty() {
            return Err(NewsmithError::agent(
                "keyword_extractor",
                "keyword extraction produced no usable keywords",
            ));
        }
        Ok(keywords)
    }
}

fn build_expansion_prompt(query: &str, conversation: &ConversationContext) -> String {
    let mut context = String::new();
    if !conversation.current_topics.is_empty() {
        context.push_str(&format!(
            "Recent topics discussed: {}\n",
            conversation.current_topics.join(", ")
        ));
    }
    if !conversation.recent_keywords.is_empty() {
        context.push_str(&format!(
            "Recent keywords used: {}\n",
            conversation.recent_keywords.join(", ")
        ));
    }
    if !conversation.last_query.is_empty() {
        context.push_str(&format!("Previous query: {}\n", conversation.last_query));
    }
    if context.is_empty() {
        context.push_str("(no prior conversation)\n");
    }

    let preferences = format!(
        "Favourite topics: {}. Preferred style: {}.",
        conversation.user_preferences.favourite_topics.join(", "),
        conversation.user_preferences.news_personality,
    );

    format!(
        r#"You optimize news queries for AND-joined keyword search.

CRITICAL CONSTRAINT: keywords are joined with AND. Every keyword must be
present in each retrieved article, so more keywords means exponentially
fewer results.

ORIGINAL USER QUERY: "{query}"

CONVERSATION CONTEXT:
{context}
USER PREFERENCES: {preferences}

Select 2-3 strategic keywords:
1. The primary entity (person, company, country).
2. The main action, event, or topic.
3. At most one contextual amplifier, only if it widens relevance.

Avoid entity redundancy ("Biden" AND "Biden administration"), synonym
stacking ("trade" + "commerce"), temporal fillers ("latest", "recent",
"2026"), and technical jargon the query never mentioned. Ask yourself:
would a typical news article about this topic contain ALL these keywords?
If not, drop the least essential one.

Examples:
- "Tesla stock problems" -> "Tesla stock decline"
- "Why did Meta fire employees?" -> "Meta layoffs"
- "Russia Ukraine war updates" -> "Russia Ukraine conflict"

RESPONSE FORMAT:
ENHANCED_QUERY: <2-3 strategic keywords>"#
    )
}

fn build_keyword_prompt(query: &str, conversation: &ConversationContext) -> String {
    format!(
        r#"You extract search keywords that maximize news article discovery.

Query: "{query}"
Recent topics: {topics}
Recent keywords: {keywords}
Favourite topics: {favourites}

Strategy:
1. Expand core entities: "social media companies" -> Meta, Google, TikTok;
   "tech companies" -> Apple, Microsoft, Amazon.
2. Broaden concepts: "AI regulation" -> artificial intelligence, AI
   governance, algorithmic accountability.
3. Exclude temporal and colloquial fillers: "latest", "recent", "drama",
   "news", "update".
4. Include relevant regulators, laws, and geographic terms when the query
   implies them.

Return 5-10 keywords as a comma-separated list, nothing else. Prioritize
specific entities and technical terms over generic concepts."#,
        topics = conversation.current_topics.join(", "),
        keywords = conversation.recent_keywords.join(", "),
        favourites = conversation.user_preferences.favourite_topics.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsmith_core::UserPreferences;

    #[test]
    fn expansion_prompt_carries_conversation_state() {
        let mut cc = ConversationContext::new("u", UserPreferences::default());
        cc.current_topics.push("Tesla Q3 earnings".to_string());
        cc.last_query = "tesla earnings".to_string();
        let prompt = build_expansion_prompt("what about the stock?", &cc);
        assert!(prompt.contains("Tesla Q3 earnings"));
        assert!(prompt.contains("tesla earnings"));
        assert!(prompt.contains("ENHANCED_QUERY:"));
    }

    #[test]
    fn keyword_prompt_requests_comma_list() {
        let cc = ConversationContext::new("u", UserPreferences::default());
        let prompt = build_keyword_prompt("gas prices inflation", &cc);
        assert!(prompt.contains("comma-separated"));
        assert!(prompt.contains("gas prices inflation"));
    }
}
