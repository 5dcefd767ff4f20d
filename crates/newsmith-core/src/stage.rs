// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-stage execution policy table.
//!
//! Each pipeline stage declares its timeout, retry policy, dependencies,
//! and data contract. The orchestrator holds this table and surfaces it
//! through health and stats; stage implementations bound their outbound
//! calls by `timeout` capped to the remaining request budget.

use std::collections::BTreeMap;
use std::time::Duration;

/// Execution policy and data contract for one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub name: String,
    pub enabled: bool,
    /// Stage-local deadline; never exceeds the remaining request budget.
    pub timeout: Duration,
    /// Attempts per outbound call, including the first.
    pub max_retries: u32,
    /// Base delay for linear backoff between attempts.
    pub retry_delay: Duration,
    /// Stages that must have completed before this one starts.
    pub depends_on: Vec<String>,
    /// Context fields this stage reads.
    pub required_inputs: Vec<String>,
    /// Context fields this stage writes.
    pub outputs: Vec<String>,
}

fn config(
    name: &str,
    timeout_secs: u64,
    max_retries: u32,
    retry_delay_secs: u64,
    depends_on: &[&str],
    required_inputs: &[&str],
    outputs: &[&str],
) -> (String, AgentConfig) {
    (
        name.to_string(),
        AgentConfig {
            name: name.to_string(),
            enabled: true,
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            retry_delay: Duration::from_secs(retry_delay_secs),
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
            required_inputs: required_inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
        },
    )
}

/// The default policy table, keyed by stage name. Covers every stage of
/// the three branches.
pub fn default_agent_configs() -> BTreeMap<String, AgentConfig> {
    BTreeMap::from([
        config(
            "memory",
            15,
            2,
            1,
            &[],
            &["user_id"],
            &["conversation_context"],
        ),
        config(
            "classifier",
            30,
            3,
            2,
            &["memory"],
            &["query", "conversation_context"],
            &["intent", "confidence"],
        ),
        config(
            "query_enhancer",
            30,
            3,
            2,
            &["classifier"],
            &["query", "intent"],
            &["enhanced_query"],
        ),
        config(
            "keyword_extractor",
            30,
            3,
            2,
            &["query_enhancer"],
            &["enhanced_query"],
            &["keywords"],
        ),
        config(
            "news_fetch",
            45,
            3,
            3,
            &["keyword_extractor"],
            &["keywords", "enhanced_query"],
            &["articles"],
        ),
        config(
            "video_fetch",
            45,
            2,
            3,
            &["keyword_extractor"],
            &["keywords", "enhanced_query"],
            &["videos"],
        ),
        config(
            "embedding_generation",
            60,
            2,
            5,
            &["news_fetch", "video_fetch"],
            &["articles", "videos", "enhanced_query"],
            &["embeddings"],
        ),
        config(
            "vector_storage",
            15,
            2,
            1,
            &["embedding_generation"],
            &["articles", "videos", "embeddings"],
            &["stored_counts"],
        ),
        config(
            "relevancy",
            30,
            3,
            2,
            &["vector_storage"],
            &["articles", "videos", "embeddings"],
            &["filtered_articles", "filtered_videos"],
        ),
        config(
            "scraper",
            30,
            3,
            2,
            &["relevancy"],
            &["filtered_articles"],
            &["article_content"],
        ),
        config(
            "summarizer",
            60,
            3,
            3,
            &["scraper"],
            &["filtered_articles", "filtered_videos", "query"],
            &["summary"],
        ),
        config(
            "persona",
            30,
            3,
            2,
            &["summarizer"],
            &["summary", "query", "user_preferences"],
            &["response"],
        ),
        config(
            "chitchat",
            45,
            3,
            3,
            &["classifier", "memory"],
            &["query", "conversation_context"],
            &["response"],
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_all_pipeline_stages() {
        let configs = default_agent_configs();
        for stage in [
            "memory",
            "classifier",
            "query_enhancer",
            "keyword_extractor",
            "news_fetch",
            "video_fetch",
            "embedding_generation",
            "vector_storage",
            "relevancy",
            "scraper",
            "summarizer",
            "persona",
            "chitchat",
        ] {
            assert!(configs.contains_key(stage), "missing stage {stage}");
        }
    }

    #[test]
    fn dependencies_reference_known_stages() {
        let configs = default_agent_configs();
        for config in configs.values() {
            for dependency in &config.depends_on {
                assert!(
                    configs.contains_key(dependency),
                    "{} depends on unknown stage {dependency}",
                    config.name
                );
            }
        }
    }

    #[test]
    fn every_stage_has_a_positive_timeout_and_at_least_one_attempt() {
        for config in default_agent_configs().values() {
            assert!(config.timeout > Duration::ZERO, "{}", config.name);
            assert!(config.max_retries >= 1, "{}", config.name);
            assert!(config.enabled);
        }
    }

    #[test]
    fn entry_names_match_their_keys() {
        for (key, config) in default_agent_configs() {
            assert_eq!(key, config.name);
        }
    }
}
