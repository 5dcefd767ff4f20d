// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for configuration loading and merging.

use newsmith_config::{load_config_from_str, validate};

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").unwrap();
    assert_eq!(config.agent.name, "newsmith");
    assert_eq!(config.embedding.concurrency, 5);
    assert_eq!(config.retrieval.news_page_size, 100);
    assert_eq!(config.retrieval.recent_hours, 48);
    assert_eq!(config.retrieval.recent_max, 15);
    assert_eq!(config.retrieval.video_max, 8);
    assert_eq!(config.retrieval.transcript_word_cap, 2500);
    assert_eq!(config.vector.article_top_k, 20);
    assert_eq!(config.vector.video_top_k, 10);
    assert_eq!(config.scraper.concurrency, 5);
    assert_eq!(config.scraper.timeout_secs, 30);
    assert!(validate(&config).is_empty());
}

#[test]
fn partial_section_overrides_merge_with_defaults() {
    let config = load_config_from_str(
        r#"
        [retrieval]
        news_page_size = 50

        [agent]
        name = "infra-news"
        "#,
    )
    .unwrap();
    assert_eq!(config.retrieval.news_page_size, 50);
    assert_eq!(config.retrieval.recent_hours, 48);
    assert_eq!(config.agent.name, "infra-news");
}

#[test]
fn unknown_keys_are_rejected() {
    let result = load_config_from_str(
        r#"
        [agent]
        nam = "typo"
        "#,
    );
    assert!(result.is_err());
}

#[test]
fn unknown_section_is_rejected() {
    let result = load_config_from_str(
        r#"
        [telemetry]
        enabled = true
        "#,
    );
    assert!(result.is_err());
}
