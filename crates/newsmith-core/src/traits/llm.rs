// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-generation port for the LLM provider.
//!
//! The core builds all prompts itself; the provider only needs a single
//! `generate` call. Higher-level operations (classification, ranking,
//! synthesis) live in `newsmith-agents` on top of this port.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::NewsmithError;
use crate::traits::CallOptions;

/// A single generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    /// System-role instruction, when the provider supports one.
    pub system_role: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: u32,
    /// Hint that the response must be a bare JSON document.
    pub json_response: bool,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_role: None,
            temperature: None,
            max_tokens: 1024,
            json_response: false,
        }
    }

    pub fn with_system_role(mut self, role: impl Into<String>) -> Self {
        self.system_role = Some(role.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn expect_json(mut self) -> Self {
        self.json_response = true;
        self
    }
}

/// The provider's answer to a [`GenerationRequest`].
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub content: String,
    pub tokens_used: u32,
    pub finish_reason: Option<String>,
    pub processing_time: Duration,
}

/// Port to the LLM provider.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates a completion for the given request. Implementations honour
    /// the cancellation token and deadline in `opts`.
    async fn generate(
        &self,
        request: GenerationRequest,
        opts: &CallOptions,
    ) -> Result<GenerationResponse, NewsmithError>;
}
