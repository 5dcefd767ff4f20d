// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock text generator for deterministic testing.
//!
//! Responses are popped from a FIFO queue; each entry is either a response
//! body or an injected error. When the queue is empty a default
//! "mock response" is returned. Every request is recorded for assertions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use newsmith_core::{
    CallOptions, GenerationRequest, GenerationResponse, NewsmithError, TextGenerator,
};
use tokio::sync::Mutex;

enum Scripted {
    Response(String),
    Error(String),
}

/// A mock LLM that replays scripted responses in order.
pub struct MockTextGenerator {
    queue: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockTextGenerator {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_responses(responses: Vec<String>) -> Self {
        let generator = Self::new();
        {
            let mut queue = generator.queue.try_lock().expect("fresh mutex");
            for response in responses {
                queue.push_back(Scripted::Response(response));
            }
        }
        generator
    }

    /// Appends a response to the queue.
    pub async fn push_response(&self, text: impl Into<String>) {
        self.queue
            .lock()
            .await
            .push_back(Scripted::Response(text.into()));
    }

    /// Appends an error to the queue; the matching call will fail.
    pub async fn push_error(&self, message: impl Into<String>) {
        self.queue
            .lock()
            .await
            .push_back(Scripted::Error(message.into()));
    }

    /// All requests seen so far, in call order.
    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockTextGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(
        &self,
        request: GenerationRequest,
        _opts: &CallOptions,
    ) -> Result<GenerationResponse, NewsmithError> {
        self.requests.lock().await.push(request);
        let scripted = self.queue.lock().await.pop_front();
        match scripted {
            Some(Scripted::Response(content)) => Ok(GenerationResponse {
                tokens_used: (content.len() / 4) as u32,
                content,
                finish_reason: Some("stop".to_string()),
                processing_time: Duration::from_millis(1),
            }),
            Some(Scripted::Error(message)) => {
                Err(NewsmithError::external("LLM_ERROR", message))
            }
            None => Ok(GenerationResponse {
                content: "mock response".to_string(),
                tokens_used: 3,
                finish_reason: Some("stop".to_string()),
                processing_time: Duration::from_millis(1),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn responses_replay_in_order_then_default() {
        let generator =
            MockTextGenerator::with_responses(vec!["first".to_string(), "second".to_string()]);
        let opts = CallOptions::unbounded();
        let r1 = generator
            .generate(GenerationRequest::new("a"), &opts)
            .await
            .unwrap();
        let r2 = generator
            .generate(GenerationRequest::new("b"), &opts)
            .await
            .unwrap();
        let r3 = generator
            .generate(GenerationRequest::new("c"), &opts)
            .await
            .unwrap();
        assert_eq!(r1.content, "first");
        assert_eq!(r2.content, "second");
        assert_eq!(r3.content, "mock response");
        assert_eq!(generator.request_count().await, 3);
    }

    #[tokio::test]
    async fn injected_errors_fail_the_matching_call() {
        let generator = MockTextGenerator::new();
        generator.push_error("scripted failure").await;
        generator.push_response("after").await;
        let opts = CallOptions::unbounded();
        let err = generator
            .generate(GenerationRequest::new("a"), &opts)
            .await
            .unwrap_err();
        assert_eq!(err.code, "LLM_ERROR");
        let ok = generator
            .generate(GenerationRequest::new("b"), &opts)
            .await
            .unwrap();
        assert_eq!(ok.content, "after");
    }
}
