// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM agent operations for the Newsmith pipeline.
//!
//! [`LlmAgents`] layers the eleven pipeline operations (classification,
//! query processing, ranking, synthesis, persona, conversational replies)
//! on top of the narrow [`TextGenerator`] port. Prompt construction is
//! pure data templating; response parsing tolerates fences and stray
//! prose; every operation leaves the fallback decision to its caller.

pub mod classify;
pub mod parse;
pub mod persona;
pub mod query;
pub mod ranking;
pub mod respond;

use std::sync::Arc;
use std::time::Duration;

use newsmith_config::model::LlmConfig;
use newsmith_core::{CallOptions, GenerationRequest, GenerationResponse, NewsmithError, TextGenerator};
use tracing::warn;

pub use classify::IntentClassification;
pub use persona::personality_prompt;

/// High-level LLM operations over the text-generation port.
pub struct LlmAgents {
    generator: Arc<dyn TextGenerator>,
    config: LlmConfig,
}

impl LlmAgents {
    pub fn new(generator: Arc<dyn TextGenerator>, config: LlmConfig) -> Self {
        Self { generator, config }
    }

    /// Issues a generation request with per-call timeout and linear-backoff
    /// retry (`delay = base * attempt`), observing cancellation between
    /// attempts. The per-attempt budget never exceeds the remaining outer
    /// deadline.
    pub(crate) async fn generate(
        &self,
        request: GenerationRequest,
        opts: &CallOptions,
    ) -> Result<GenerationResponse, NewsmithError> {
        let call_timeout = Duration::from_secs(self.config.timeout_secs);
        let base_delay = Duration::from_millis(self.config.retry_delay_ms);
        let mut last_err: Option<NewsmithError> = None;

        for attempt in 1..=self.config.max_retries {
            if opts.is_cancelled() {
                return Err(NewsmithError::cancelled(""));
            }

            let budget = opts.stage_budget(call_timeout);
            let outcome = tokio::select! {
                _ = opts.cancel.cancelled() => return Err(NewsmithError::cancelled("")),
                result = tokio::time::timeout(budget, self.generator.generate(request.clone(), opts)) => result,
            };

            match outcome {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(err)) => {
                    warn!(attempt, max_retries = self.config.max_retries, error = %err, "generation attempt failed");
                    last_err = Some(err);
                }
                Err(_) => {
                    warn!(attempt, budget_ms = budget.as_millis() as u64, "generation attempt timed out");
                    last_err = Some(NewsmithError::timeout(
                        "LLM_TIMEOUT",
                        "text generation timed out",
                    ));
                }
            }

            if attempt < self.config.max_retries {
                let delay = base_delay * attempt;
                tokio::select! {
                    _ = opts.cancel.cancelled() => return Err(NewsmithError::cancelled("")),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| NewsmithError::external("LLM_ERROR", "text generation failed")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyGenerator {
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl TextGenerator for FlakyGenerator {
        async fn generate(
            &self,
            _request: GenerationRequest,
            _opts: &CallOptions,
        ) -> Result<GenerationResponse, NewsmithError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err(NewsmithError::external("LLM_ERROR", "transient"))
            } else {
                Ok(GenerationResponse {
                    content: "ok".to_string(),
                    tokens_used: 1,
                    finish_reason: None,
                    processing_time: Duration::from_millis(1),
                })
            }
        }
    }

    fn fast_config() -> LlmConfig {
        LlmConfig {
            timeout_secs: 5,
            max_retries: 3,
            retry_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let agents = LlmAgents::new(
            Arc::new(FlakyGenerator {
                failures_before_success: 2,
                calls: AtomicU32::new(0),
            }),
            fast_config(),
        );
        let response = agents
            .generate(GenerationRequest::new("hi"), &CallOptions::unbounded())
            .await
            .unwrap();
        assert_eq!(response.content, "ok");
    }

    #[tokio::test]
    async fn exhausted_retries_surface_last_error() {
        let agents = LlmAgents::new(
            Arc::new(FlakyGenerator {
                failures_before_success: 10,
                calls: AtomicU32::new(0),
            }),
            fast_config(),
        );
        let err = agents
            .generate(GenerationRequest::new("hi"), &CallOptions::unbounded())
            .await
            .unwrap_err();
        assert_eq!(err.code, "LLM_ERROR");
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let agents = LlmAgents::new(
            Arc::new(FlakyGenerator {
                failures_before_success: 0,
                calls: AtomicU32::new(0),
            }),
            fast_config(),
        );
        let opts = CallOptions::unbounded();
        opts.cancel.cancel();
        let err = agents
            .generate(GenerationRequest::new("hi"), &opts)
            .await
            .unwrap_err();
        assert!(err.is_cancellation());
    }
}
