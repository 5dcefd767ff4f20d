// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent classification: the context-aware primary path and the two-way
//! fallback path.
//!
//! The primary prompt includes the last three exchanges and demands a
//! single JSON object. When that call fails or the JSON does not decode,
//! the caller drops to [`LlmAgents::classify_intent_simple`], and finally
//! to `(Chitchat, 0.0)`.

use newsmith_core::{
    CallOptions, ConversationContext, ConversationExchange, GenerationRequest, Intent,
    NewsmithError,
};
use serde::Deserialize;

use crate::parse::strip_code_fences;
use crate::LlmAgents;

/// Output of the context-aware intent classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentClassification {
    pub intent: Intent,
    pub confidence: f32,
    pub reasoning: String,
    pub enhanced_query: Option<String>,
    pub referenced_topic: Option<String>,
    pub referenced_exchange_id: Option<String>,
}

impl IntentClassification {
    /// Terminal fallback when every classification path has failed.
    pub fn chitchat_fallback(reasoning: impl Into<String>) -> Self {
        Self {
            intent: Intent::Chitchat,
            confidence: 0.0,
            reasoning: reasoning.into(),
            enhanced_query: None,
            referenced_topic: None,
            referenced_exchange_id: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    intent: String,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    enhanced_query: Option<String>,
    #[serde(default)]
    referenced_topic: Option<String>,
    #[serde(default)]
    referenced_exchange_id: Option<String>,
}

impl LlmAgents {
    /// Context-aware three-way intent classification.
    pub async fn classify_intent(
        &self,
        query: &str,
        history: &[ConversationExchange],
        opts: &CallOptions,
    ) -> Result<IntentClassification, NewsmithError> {
        let window = &history[history.len().saturating_sub(3)..];
        let prompt = build_classification_prompt(query, window);
        let request = GenerationRequest::new(prompt)
            .with_system_role("You are an expert conversational intent classifier for a news AI assistant")
            .with_temperature(0.2)
            .with_max_tokens(1024)
            .expect_json();

        let response = self.generate(request, opts).await?;
        parse_classification(&response.content).ok_or_else(|| {
            NewsmithError::agent("classifier", "intent response was not valid JSON")
        })
    }

    /// Two-way fallback classification (news vs chitchat).
    pub async fn classify_intent_simple(
        &self,
        query: &str,
        conversation: &ConversationContext,
        opts: &CallOptions,
    ) -> Result<(Intent, f32), NewsmithError> {
        let prompt = build_simple_prompt(query, conversation);
        let request = GenerationRequest::new(prompt)
            .with_system_role("You are a highly accurate intent classifier for a news AI assistant.")
            .with_temperature(0.1)
            .with_max_tokens(64);

        let response = self.generate(request, opts).await?;
        Ok(parse_simple_intent(&response.content))
    }
}

fn build_classification_prompt(query: &str, history: &[ConversationExchange]) -> String {
    let mut history_context = String::new();
    for (i, exchange) in history.iter().enumerate() {
        history_context.push_str(&format!(
            "Exchange {} (id {}):\nUser: {}\nAssistant: {}\n\n",
            i + 1,
            exchange.id,
            exchange.user_query,
            exchange.assistant_response
        ));
    }
    if history_context.is_empty() {
        history_context.push_str("(no prior conversation)\n");
    }

    format!(
        r#"Classify the user's intent based on their query and conversation history.

CONVERSATION HISTORY:
{history_context}
CURRENT QUERY: "{query}"

CLASSIFICATION RULES:

1. "new_news_query" - the user asks about a new topic or event, the query is
   self-contained, or they want fresh news analysis.
   Examples: "What's happening with Tesla?", "Why are gas prices rising?"

2. "follow_up_discussion" - the query references the previous conversation
   ("this", "that", "it", "the situation"), or asks for clarification, more
   detail, or a different perspective on a topic already discussed.
   Examples: "Tell me more about this", "How does this affect me?"

3. "chitchat" - greetings, personal questions, casual conversation, or
   anything not news related.

RESPONSE FORMAT (respond with only this JSON object):
{{
  "intent": "new_news_query|follow_up_discussion|chitchat",
  "confidence": 0.95,
  "reasoning": "brief explanation",
  "referenced_topic": "topic from history if follow-up",
  "referenced_exchange_id": "exchange id if follow-up",
  "enhanced_query": "self-contained version if needed"
}}"#
    )
}

fn build_simple_prompt(query: &str, conversation: &ConversationContext) -> String {
    format!(
        r#"Classify this query as "news" or "chitchat".

Query: "{query}"
Recent topics: {topics}

"news": requests for factual information about current or past events,
companies, people, technologies, or anything that could appear in news.
"chitchat": greetings, jokes, social questions, casual conversation.

Output exactly one line, no extra text:

intent|confidence_score

Examples:
news|0.95
chitchat|0.88"#,
        topics = conversation.current_topics.join(", "),
    )
}

/// Parses the primary classifier JSON; `None` activates the fallback chain.
pub fn parse_classification(response: &str) -> Option<IntentClassification> {
    let stripped = strip_code_fences(response);
    let raw: RawClassification = serde_json::from_str(stripped).ok()?;
    let intent = parse_intent_tag(&raw.intent)?;
    Some(IntentClassification {
        intent,
        confidence: raw.confidence.clamp(0.0, 1.0),
        reasoning: raw.reasoning,
        enhanced_query: raw.enhanced_query.filter(|q| !q.trim().is_empty()),
        referenced_topic: raw.referenced_topic.filter(|t| !t.trim().is_empty()),
        referenced_exchange_id: raw.referenced_exchange_id.filter(|i| !i.trim().is_empty()),
    })
}

fn parse_intent_tag(tag: &str) -> Option<Intent> {
    let normalized = tag.trim().to_lowercase();
    match normalized.as_str() {
        "new_news_query" => Some(Intent::NewNewsQuery),
        "follow_up_discussion" => Some(Intent::FollowUpDiscussion),
        "chitchat" | "chit_chat" => Some(Intent::Chitchat),
        _ if normalized.contains("news") => Some(Intent::NewNewsQuery),
        _ if normalized.contains("follow") => Some(Intent::FollowUpDiscussion),
        _ if normalized.contains("chat") => Some(Intent::Chitchat),
        _ => None,
    }
}

/// Parses the `intent|confidence` line format, with keyword heuristics when
/// the model strays from it.
pub fn parse_simple_intent(response: &str) -> (Intent, f32) {
    let trimmed = response.trim();
    if let Some((intent_part, confidence_part)) = trimmed.split_once('|') {
        let confidence = confidence_part.trim().parse::<f32>().unwrap_or(0.9);
        match intent_part.trim().to_lowercase().as_str() {
            "news" => return (Intent::NewNewsQuery, confidence.clamp(0.0, 1.0)),
            "chitchat" | "chit_chat" => return (Intent::Chitchat, confidence.clamp(0.0, 1.0)),
            _ => {}
        }
    }

    let lower = trimmed.to_lowercase();
    if ["news", "breaking", "current", "article"]
        .iter()
        .any(|marker| lower.contains(marker))
    {
        return (Intent::NewNewsQuery, 0.8);
    }
    if ["chit_chat", "chat", "casual", "conversation", "hello", "hi"]
        .iter()
        .any(|marker| lower.contains(marker))
    {
        return (Intent::Chitchat, 0.8);
    }
    (Intent::Chitchat, 0.4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_classification_json() {
        let response = r#"```json
        {
          "intent": "follow_up_discussion",
          "confidence": 0.92,
          "reasoning": "references prior topic",
          "referenced_topic": "Tesla Q3 earnings",
          "referenced_exchange_id": "ex-7",
          "enhanced_query": "Tesla Q3 earnings details"
        }
        ```"#;
        let parsed = parse_classification(response).unwrap();
        assert_eq!(parsed.intent, Intent::FollowUpDiscussion);
        assert_eq!(parsed.confidence, 0.92);
        assert_eq!(parsed.referenced_topic.as_deref(), Some("Tesla Q3 earnings"));
        assert_eq!(parsed.referenced_exchange_id.as_deref(), Some("ex-7"));
    }

    #[test]
    fn blank_optional_fields_become_none() {
        let response =
            r#"{"intent": "chitchat", "confidence": 0.7, "reasoning": "", "referenced_topic": "  "}"#;
        let parsed = parse_classification(response).unwrap();
        assert_eq!(parsed.intent, Intent::Chitchat);
        assert!(parsed.referenced_topic.is_none());
    }

    #[test]
    fn malformed_json_yields_none() {
        assert!(parse_classification("definitely not json").is_none());
        assert!(parse_classification(r#"{"confidence": 0.5}"#).is_none());
    }

    #[test]
    fn loose_intent_tags_are_tolerated() {
        let parsed =
            parse_classification(r#"{"intent": "NEW_NEWS_QUERY", "confidence": 0.8}"#).unwrap();
        assert_eq!(parsed.intent, Intent::NewNewsQuery);
    }

    #[test]
    fn confidence_is_clamped() {
        let parsed = parse_classification(r#"{"intent": "chitchat", "confidence": 3.0}"#).unwrap();
        assert_eq!(parsed.confidence, 1.0);
    }

    #[test]
    fn simple_intent_pipe_format() {
        assert_eq!(parse_simple_intent("news|0.95"), (Intent::NewNewsQuery, 0.95));
        assert_eq!(parse_simple_intent("chitchat|0.6"), (Intent::Chitchat, 0.6));
    }

    #[test]
    fn simple_intent_keyword_fallback() {
        let (intent, confidence) = parse_simple_intent("This looks like breaking news coverage");
        assert_eq!(intent, Intent::NewNewsQuery);
        assert_eq!(confidence, 0.8);
    }

    #[test]
    fn simple_intent_defaults_to_chitchat() {
        let (intent, confidence) = parse_simple_intent("???");
        assert_eq!(intent, Intent::Chitchat);
        assert_eq!(confidence, 0.4);
    }

    #[test]
    fn prompt_includes_history_window() {
        let mut cc = ConversationContext::new("u", Default::default());
        for i in 0..5 {
            cc.add_exchange(&format!("q{i}"), "r", Intent::Chitchat, &[], &[], &[], 0);
        }
        let prompt = build_classification_prompt("tell me more", cc.recent_exchanges(3));
        assert!(prompt.contains("q2"));
        assert!(prompt.contains("q4"));
        assert!(!prompt.contains("q1\n"));
    }
}
