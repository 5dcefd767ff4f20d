// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end pipeline scenarios over the mock harness.

use std::time::Duration;

use newsmith_core::{
    CallOptions, Collection, ConversationContext, Intent, UpdateType, UserPreferences,
    WorkflowStatus,
};
use newsmith_core::MemoryStore;
use newsmith_test_utils::{fixtures, TestHarness};

/// Scripted LLM queue for a news happy path, in call order: classifier,
/// query enhancer, keyword extractor, article ranking, video ranking,
/// summarizer, persona.
fn news_happy_path_responses() -> Vec<String> {
    vec![
        fixtures::classification_json("new_news_query", 0.95),
        "ENHANCED_QUERY: gas prices inflation".to_string(),
        "gas prices, inflation, energy markets".to_string(),
        fixtures::article_ranking_json(5, 0.9),
        fixtures::video_ranking_json(3, 0.8),
        "Summary: gas prices rose as detailed in Story 0: markets react.".to_string(),
        "Friendly take: as Story 0: markets react explains, prices rose.".to_string(),
    ]
}

#[tokio::test]
async fn news_happy_path_completes_with_styled_summary() {
    let harness = TestHarness::builder()
        .with_llm_responses(news_happy_path_responses())
        .build();
    harness.news.push_keyword_result(fixtures::articles(30)).await;
    harness.videos.push_keyword_result(fixtures::videos(6)).await;

    let response = harness
        .orchestrator
        .execute(fixtures::request("user-1", "Why are US gas prices rising?"))
        .await;

    assert_eq!(response.status, "completed");
    assert!(response.message.contains("Story 0"));
    assert!(response.total_time_ms.is_some());

    // All twelve news-branch stages emitted processing + completed.
    let events = harness.progress.events_for("user-1");
    assert_eq!(events[0].update_type, UpdateType::WorkflowStarted);
    assert_eq!(
        events.last().unwrap().update_type,
        UpdateType::WorkflowCompleted
    );
    for stage in newsmith_orchestrator::NEWS_STAGES {
        let stage_events: Vec<_> = events
            .iter()
            .filter(|e| e.agent_name == stage)
            .collect();
        assert_eq!(stage_events.len(), 2, "stage {stage} should emit two events");
    }

    // Final context counters.
    let status = harness
        .orchestrator
        .get_status(&response.workflow_id)
        .await
        .unwrap();
    assert_eq!(status.status, WorkflowStatus::Completed);
    assert_eq!(status.intent, Some(Intent::NewNewsQuery));
    assert_eq!(status.processing_stats.articles_found, 30);
    assert!(status.processing_stats.articles_filtered >= 1);
    assert!(status.processing_stats.articles_filtered <= 8);
    assert!(status
        .articles
        .iter()
        .all(|a| (0.0..=1.0).contains(&a.relevance_score.unwrap())));

    // Fresh corpus was written to the vector store.
    assert_eq!(harness.vector_store.record_count(Collection::Articles), 30);
    assert_eq!(harness.vector_store.record_count(Collection::Videos), 6);

    // Exactly one new exchange persisted.
    let conversation = harness
        .memory_store
        .load_conversation("user-1", &CallOptions::unbounded())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conversation.exchanges.len(), 1);
    assert_eq!(
        conversation.exchanges[0].user_query,
        "Why are US gas prices rising?"
    );
}

#[tokio::test]
async fn progress_is_non_decreasing_for_live_events() {
    let harness = TestHarness::builder()
        .with_llm_responses(news_happy_path_responses())
        .build();
    harness.news.push_keyword_result(fixtures::articles(10)).await;
    harness.videos.push_keyword_result(fixtures::videos(2)).await;

    harness
        .orchestrator
        .execute(fixtures::request("user-1", "Why are US gas prices rising?"))
        .await;

    let events = harness.progress.events_for("user-1");
    let mut last = 0.0f32;
    for event in events
        .iter()
        .filter(|e| e.update_type == UpdateType::AgentUpdate)
        .filter(|e| {
            matches!(
                e.status,
                newsmith_core::AgentStatus::Processing | newsmith_core::AgentStatus::Completed
            )
        })
    {
        assert!(
            event.progress >= last,
            "progress regressed at {}: {} < {last}",
            event.agent_name,
            event.progress
        );
        last = event.progress;
    }
}

#[tokio::test]
async fn follow_up_reuses_memory_without_retrieval() {
    let harness = TestHarness::builder()
        .with_llm_responses(vec![
            r#"{"intent": "follow_up_discussion", "confidence": 0.92, "reasoning": "references prior topic", "referenced_topic": "Tesla Q3 earnings"}"#.to_string(),
            "Building on the Tesla Q3 earnings we discussed: margins improved.".to_string(),
        ])
        .build();

    // Prior exchange in memory.
    let mut conversation = ConversationContext::new("user-2", UserPreferences::default());
    conversation.add_exchange(
        "what happened with tesla earnings?",
        "Tesla reported stronger than expected Q3 earnings.",
        Intent::NewNewsQuery,
        &["Tesla Q3 earnings".to_string()],
        &[],
        &["tesla".to_string(), "earnings".to_string()],
        900,
    );
    harness
        .memory_store
        .save_conversation(&conversation, &CallOptions::unbounded())
        .await
        .unwrap();

    let response = harness
        .orchestrator
        .execute(fixtures::request("user-2", "tell me more about this"))
        .await;

    assert_eq!(response.status, "completed");
    assert!(response.message.contains("Tesla Q3 earnings"));

    let status = harness
        .orchestrator
        .get_status(&response.workflow_id)
        .await
        .unwrap();
    assert_eq!(status.intent, Some(Intent::FollowUpDiscussion));
    assert!(status.is_follow_up);
    assert_eq!(status.referenced_topic, "Tesla Q3 earnings");

    // No retrieval stages ran.
    let events = harness.progress.events_for("user-2");
    assert!(events.iter().all(|e| e.agent_name != "news_fetch"));
    assert!(events.iter().all(|e| e.agent_name != "embedding_generation"));

    // The exchange count grew by exactly one.
    let conversation = harness
        .memory_store
        .load_conversation("user-2", &CallOptions::unbounded())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conversation.exchanges.len(), 2);
}

#[tokio::test]
async fn chitchat_memory_probe_sees_prior_facts() {
    let harness = TestHarness::builder()
        .with_llm_responses(vec![
            fixtures::classification_json("chitchat", 0.9),
            "Your name is John! You told me that earlier.".to_string(),
        ])
        .build();

    let mut conversation = ConversationContext::new("user-3", UserPreferences::default());
    conversation.add_exchange(
        "My name is John.",
        "Nice to meet you, John!",
        Intent::Chitchat,
        &[],
        &[],
        &[],
        100,
    );
    harness
        .memory_store
        .save_conversation(&conversation, &CallOptions::unbounded())
        .await
        .unwrap();

    let response = harness
        .orchestrator
        .execute(fixtures::request("user-3", "What's my name?"))
        .await;

    assert_eq!(response.status, "completed");
    assert!(response.message.contains("John"));

    // The chitchat prompt itself carried the prior fact.
    let requests = harness.llm.requests().await;
    let chitchat_prompt = &requests.last().unwrap().prompt;
    assert!(chitchat_prompt.contains("My name is John."));
}

#[tokio::test]
async fn empty_keyword_results_trigger_recent_news_fallback() {
    let harness = TestHarness::builder()
        .with_llm_responses(vec![
            fixtures::classification_json("new_news_query", 0.9),
            "ENHANCED_QUERY: niche story".to_string(),
            "niche, story, coverage".to_string(),
            fixtures::article_ranking_json(2, 0.8),
            // No videos were found, so no video-ranking call happens.
            "Summary from recent coverage.".to_string(),
            "Styled summary from recent coverage.".to_string(),
        ])
        .build();
    // Keyword search finds nothing; the 48-hour recent search succeeds.
    harness.news.push_keyword_result(Vec::new()).await;
    harness.news.push_recent_result(fixtures::articles(3)).await;

    let response = harness
        .orchestrator
        .execute(fixtures::request("user-9", "anything on the niche story?"))
        .await;

    assert_eq!(response.status, "completed");
    let status = harness
        .orchestrator
        .get_status(&response.workflow_id)
        .await
        .unwrap();
    assert_eq!(status.processing_stats.articles_found, 3);
}

#[tokio::test]
async fn news_retrieval_exhaustion_fails_with_external_error() {
    let harness = TestHarness::builder()
        .with_llm_responses(vec![
            fixtures::classification_json("new_news_query", 0.9),
            "ENHANCED_QUERY: obscure topic".to_string(),
            "obscure, topic, keywords".to_string(),
        ])
        .build();
    harness.news.push_keyword_error("provider unavailable").await;
    harness.news.push_recent_result(Vec::new()).await;
    harness.videos.push_keyword_result(fixtures::videos(3)).await;

    let response = harness
        .orchestrator
        .execute(fixtures::request("user-4", "anything on this?"))
        .await;

    assert_eq!(response.status, "failed");
    assert!(response.message.to_lowercase().contains("news search"));

    let events = harness.progress.events_for("user-4");
    assert_eq!(
        events.last().unwrap().update_type,
        UpdateType::WorkflowError
    );
    // The pipeline never reached synthesis; video results were discarded.
    assert!(events.iter().all(|e| e.agent_name != "summarizer"));
    let status = harness
        .orchestrator
        .get_status(&response.workflow_id)
        .await
        .unwrap();
    assert_eq!(status.status, WorkflowStatus::Failed);
}

#[tokio::test]
async fn video_embedding_failure_degrades_to_articles_only() {
    let harness = TestHarness::builder()
        .with_llm_responses(vec![
            fixtures::classification_json("new_news_query", 0.9),
            "ENHANCED_QUERY: gas prices".to_string(),
            "gas, prices, energy".to_string(),
            fixtures::article_ranking_json(3, 0.9),
            // Video ranking errors; with no semantic videos the cascade drops them.
            "".to_string(),
        ])
        .build();
    // Make every video text fail to embed; article texts are unaffected.
    harness.embedder.fail_on("Video");
    harness.news.push_keyword_result(fixtures::articles(6)).await;
    harness.videos.push_keyword_result(fixtures::videos(4)).await;
    // Re-script the tail: ranking error then summary + persona.
    harness.llm.push_response("Summary from articles only.").await;
    harness.llm.push_response("Styled summary from articles only.").await;

    let response = harness
        .orchestrator
        .execute(fixtures::request("user-5", "why are gas prices rising?"))
        .await;

    assert_eq!(response.status, "completed");
    let status = harness
        .orchestrator
        .get_status(&response.workflow_id)
        .await
        .unwrap();
    assert_eq!(status.processing_stats.videos_filtered, 0);
    assert!(status.videos.is_empty());
    assert!(!status.articles.is_empty());
    // Videos never reached the vector store.
    assert_eq!(harness.vector_store.record_count(Collection::Videos), 0);

    let events = harness.progress.events_for("user-5");
    assert_eq!(
        events.last().unwrap().update_type,
        UpdateType::WorkflowCompleted
    );
}

#[tokio::test]
async fn cancellation_mid_pipeline_stops_event_flow() {
    let harness = TestHarness::builder()
        .with_llm_responses(vec![
            fixtures::classification_json("new_news_query", 0.9),
            "ENHANCED_QUERY: slow topic".to_string(),
            "slow, topic, news".to_string(),
        ])
        .build();
    harness.news.push_keyword_result(fixtures::articles(4)).await;
    harness.videos.push_keyword_result(fixtures::videos(2)).await;
    // Slow embeddings keep the workflow inside the embedding fan-out.
    harness.embedder.set_delay(Duration::from_millis(300));

    let mut request = fixtures::request("user-6", "slow news query");
    request.workflow_id = Some("wf-cancel-1".to_string());

    let orchestrator = &harness.orchestrator;
    let (response, cancel_result) = tokio::join!(orchestrator.execute(request), async {
        // Let the pipeline reach the embedding stage, then cancel.
        tokio::time::sleep(Duration::from_millis(100)).await;
        orchestrator.cancel("wf-cancel-1").await
    });

    cancel_result.unwrap();
    assert_eq!(response.status, "failed");

    let status = harness
        .orchestrator
        .get_status("wf-cancel-1")
        .await
        .unwrap();
    assert_eq!(status.status, WorkflowStatus::Failed);

    // The terminal event is the error envelope; nothing follows it.
    let events = harness.progress.events_for("user-6");
    assert_eq!(
        events.last().unwrap().update_type,
        UpdateType::WorkflowError
    );
    // No conversation exchange was committed.
    let conversation = harness
        .memory_store
        .load_conversation("user-6", &CallOptions::unbounded())
        .await
        .unwrap();
    assert!(conversation.is_none() || conversation.unwrap().exchanges.is_empty());
}

#[tokio::test]
async fn duplicate_workflow_ids_keep_one_live_entry() {
    let harness = TestHarness::builder()
        .with_llm_responses(vec![
            fixtures::classification_json("new_news_query", 0.9),
            "ENHANCED_QUERY: dup".to_string(),
            "dup, topic, news".to_string(),
        ])
        .build();
    harness.news.push_keyword_result(fixtures::articles(2)).await;
    harness.embedder.set_delay(Duration::from_millis(200));

    let mut first = fixtures::request("user-7", "first submission");
    first.workflow_id = Some("wf-dup".to_string());
    let mut second = fixtures::request("user-7", "second submission");
    second.workflow_id = Some("wf-dup".to_string());

    let orchestrator = &harness.orchestrator;
    let (first_response, second_response) = tokio::join!(orchestrator.execute(first), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        // The duplicate is rejected while the first run is live, and the
        // submitter can observe the first run's state instead.
        let rejected = orchestrator.execute(second).await;
        let observed = orchestrator.get_status("wf-dup").await.unwrap();
        (rejected, observed)
    });

    let (rejected, observed) = second_response;
    assert_eq!(rejected.status, "failed");
    assert!(rejected.message.contains("already executing"));
    assert_eq!(observed.id, "wf-dup");
    // The first submission ran to its own terminal state.
    assert!(first_response.status == "completed" || first_response.status == "failed");
    assert_eq!(harness.orchestrator.active_count(), 0);
}

#[tokio::test]
async fn unknown_workflow_status_is_not_found() {
    let harness = TestHarness::builder().build();
    let err = harness.orchestrator.get_status("ghost").await.unwrap_err();
    assert_eq!(err.code, "WORKFLOW_NOT_FOUND");
}

#[tokio::test]
async fn close_returns_once_registry_drains() {
    let harness = TestHarness::builder()
        .with_llm_responses(vec![
            fixtures::classification_json("chitchat", 0.9),
            "bye!".to_string(),
        ])
        .build();
    harness
        .orchestrator
        .execute(fixtures::request("user-8", "bye"))
        .await;
    // No live workflows: close returns without waiting out the grace period.
    tokio::time::timeout(Duration::from_secs(2), harness.orchestrator.close())
        .await
        .expect("close should return promptly");
}
