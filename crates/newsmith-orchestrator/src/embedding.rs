// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch embedding with bounded concurrency and per-item retry.
//!
//! Items within one set run in parallel, capped by the configured
//! concurrency. Each item retries with linearly increasing delay
//! (attempt x base). A single item failing after its retries aborts the
//! whole set; the caller decides whether that is fatal.

use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use newsmith_core::{CallOptions, EmbeddingProvider, NewsmithError};
use newsmith_config::model::EmbeddingConfig;
use tokio::sync::Semaphore;
use tracing::warn;

/// Embeds every text, preserving input order.
pub async fn embed_batch(
    provider: Arc<dyn EmbeddingProvider>,
    texts: &[String],
    config: &EmbeddingConfig,
    opts: &CallOptions,
) -> Result<Vec<Vec<f32>>, NewsmithError> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let futures = texts.iter().enumerate().map(|(index, text)| {
        let provider = provider.clone();
        let semaphore = semaphore.clone();
        let opts = opts.clone();
        let config = config.clone();
        async move {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|_| NewsmithError::internal("SEMAPHORE_CLOSED", "embedding pool closed"))?;
            embed_one(provider.as_ref(), text, index, &config, &opts).await
        }
    });

    try_join_all(futures).await
}

async fn embed_one(
    provider: &dyn EmbeddingProvider,
    text: &str,
    index: usize,
    config: &EmbeddingConfig,
    opts: &CallOptions,
) -> Result<Vec<f32>, NewsmithError> {
    let base_delay = Duration::from_millis(config.retry_delay_ms);
    let mut last_err: Option<NewsmithError> = None;

    for attempt in 1..=config.max_retries {
        if opts.is_cancelled() {
            return Err(NewsmithError::cancelled(""));
        }
        let budget = opts.stage_budget(Duration::from_secs(config.timeout_secs));
        let outcome = tokio::select! {
            _ = opts.cancel.cancelled() => return Err(NewsmithError::cancelled("")),
            result = tokio::time::timeout(budget, provider.embed(text, opts)) => result,
        };
        match outcome {
            Ok(Ok(vector)) => return Ok(vector),
            Ok(Err(err)) => {
                warn!(index, attempt, error = %err, "embedding attempt failed");
                last_err = Some(err);
            }
            Err(_) => {
                last_err = Some(NewsmithError::timeout(
                    "EMBEDDING_TIMEOUT",
                    format!("embedding item {index} timed out"),
                ));
            }
        }
        if attempt < config.max_retries {
            let delay = base_delay * attempt;
            tokio::select! {
                _ = opts.cancel.cancelled() => return Err(NewsmithError::cancelled("")),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| NewsmithError::external("EMBEDDING_ERROR", "embedding failed")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        fail_text: Option<String>,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        async fn embed(&self, text: &str, _opts: &CallOptions) -> Result<Vec<f32>, NewsmithError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.fail_text.as_deref() == Some(text) {
                return Err(NewsmithError::external("EMBEDDING_ERROR", "bad item"));
            }
            Ok(vec![text.len() as f32])
        }
    }

    fn config() -> EmbeddingConfig {
        EmbeddingConfig {
            concurrency: 5,
            max_retries: 2,
            retry_delay_ms: 1,
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn results_preserve_input_order() {
        let provider = Arc::new(CountingProvider {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            fail_text: None,
        });
        let texts: Vec<String> = (1..=8).map(|i| "x".repeat(i)).collect();
        let vectors = embed_batch(provider, &texts, &config(), &CallOptions::unbounded())
            .await
            .unwrap();
        assert_eq!(vectors.len(), 8);
        for (i, vector) in vectors.iter().enumerate() {
            assert_eq!(vector[0], (i + 1) as f32);
        }
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let provider = Arc::new(CountingProvider {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            fail_text: None,
        });
        let texts: Vec<String> = (0..20).map(|i| format!("t{i}")).collect();
        embed_batch(provider.clone(), &texts, &config(), &CallOptions::unbounded())
            .await
            .unwrap();
        assert!(provider.peak.load(Ordering::SeqCst) <= 5);
    }

    #[tokio::test]
    async fn single_failure_aborts_the_set() {
        let provider = Arc::new(CountingProvider {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            fail_text: Some("poison".to_string()),
        });
        let texts = vec!["ok".to_string(), "poison".to_string(), "fine".to_string()];
        let err = embed_batch(provider, &texts, &config(), &CallOptions::unbounded())
            .await
            .unwrap_err();
        assert_eq!(err.code, "EMBEDDING_ERROR");
    }

    #[tokio::test]
    async fn empty_input_is_empty_output() {
        let provider = Arc::new(CountingProvider {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            fail_text: None,
        });
        let vectors = embed_batch(provider, &[], &config(), &CallOptions::unbounded())
            .await
            .unwrap();
        assert!(vectors.is_empty());
    }
}
