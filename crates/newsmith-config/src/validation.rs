// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration validation with actionable diagnostics.

use crate::model::NewsmithConfig;

/// A single configuration problem, with the key path that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub key: String,
    pub message: String,
}

/// Validates a loaded configuration, returning every problem found.
pub fn validate(config: &NewsmithConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut push = |key: &str, message: String| {
        diagnostics.push(Diagnostic {
            key: key.to_string(),
            message,
        });
    };

    if config.embedding.concurrency == 0 {
        push(
            "embedding.concurrency",
            "must be at least 1".to_string(),
        );
    }
    if config.scraper.concurrency == 0 {
        push("scraper.concurrency", "must be at least 1".to_string());
    }
    if config.llm.max_retries == 0 {
        push("llm.max_retries", "must be at least 1".to_string());
    }
    if config.embedding.max_retries == 0 {
        push("embedding.max_retries", "must be at least 1".to_string());
    }
    if config.retrieval.news_page_size == 0 {
        push("retrieval.news_page_size", "must be at least 1".to_string());
    }
    if config.retrieval.video_max == 0 {
        push("retrieval.video_max", "must be at least 1".to_string());
    }
    if config.workflow.request_timeout_secs == 0 {
        push(
            "workflow.request_timeout_secs",
            "must be at least 1 second".to_string(),
        );
    }
    if config.vector.article_top_k == 0 || config.vector.video_top_k == 0 {
        push("vector", "top_k values must be at least 1".to_string());
    }

    let level = config.agent.log_level.as_str();
    if !matches!(level, "trace" | "debug" | "info" | "warn" | "error") {
        push(
            "agent.log_level",
            format!("unknown log level {level:?}; expected trace|debug|info|warn|error"),
        );
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&NewsmithConfig::default()).is_empty());
    }

    #[test]
    fn zero_concurrency_is_flagged() {
        let mut config = NewsmithConfig::default();
        config.embedding.concurrency = 0;
        let diagnostics = validate(&config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].key, "embedding.concurrency");
    }

    #[test]
    fn bad_log_level_is_flagged() {
        let mut config = NewsmithConfig::default();
        config.agent.log_level = "loud".to_string();
        let diagnostics = validate(&config);
        assert!(diagnostics.iter().any(|d| d.key == "agent.log_level"));
    }
}
