// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Newsmith pipeline.
//!
//! A single [`NewsmithError`] carries an [`ErrorKind`] (the taxonomy used for
//! propagation decisions), a stable code, a human message, and optional
//! request/workflow/user/stage context. Stages decide recover/degrade/abort
//! by kind, never by string matching.

use std::time::Duration;

use strum::{Display, EnumString};
use thiserror::Error;

/// Classification of an error for propagation and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    Timeout,
    RateLimit,
    External,
    Internal,
    Unavailable,
    CircuitBreaker,
    Agent,
}

/// The primary error type used across all Newsmith ports and stages.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct NewsmithError {
    /// Taxonomy kind driving propagation policy.
    pub kind: ErrorKind,
    /// Stable machine-readable code (e.g. `NEWS_SEARCH_FAILED`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Request this error occurred in, if known.
    pub request_id: Option<String>,
    /// Workflow this error occurred in, if known.
    pub workflow_id: Option<String>,
    /// User the workflow belonged to, if known.
    pub user_id: Option<String>,
    /// Pipeline stage that produced the error, if any.
    pub stage: Option<String>,
    /// Whether the caller may retry the operation.
    pub retryable: bool,
    /// Suggested delay before retrying.
    pub retry_after: Option<Duration>,
    /// Underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl NewsmithError {
    fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            request_id: None,
            workflow_id: None,
            user_id: None,
            stage: None,
            retryable: false,
            retry_after: None,
            source: None,
        }
    }

    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, code, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, code, message)
    }

    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, code, message)
    }

    pub fn timeout(code: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new(ErrorKind::Timeout, code, message);
        err.retryable = true;
        err.retry_after = Some(Duration::from_secs(5));
        err
    }

    pub fn rate_limit(
        code: impl Into<String>,
        message: impl Into<String>,
        retry_after: Duration,
    ) -> Self {
        let mut err = Self::new(ErrorKind::RateLimit, code, message);
        err.retryable = true;
        err.retry_after = Some(retry_after);
        err
    }

    pub fn external(code: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new(ErrorKind::External, code, message);
        err.retryable = true;
        err.retry_after = Some(Duration::from_secs(3));
        err
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, code, message)
    }

    pub fn unavailable(code: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new(ErrorKind::Unavailable, code, message);
        err.retryable = true;
        err.retry_after = Some(Duration::from_secs(10));
        err
    }

    /// Error raised by a pipeline stage ("agent" in stream terminology).
    pub fn agent(stage: impl Into<String>, message: impl Into<String>) -> Self {
        let stage = stage.into();
        let code = format!("{}_AGENT_ERROR", stage.to_uppercase());
        let mut err = Self::new(ErrorKind::Agent, code, message);
        err.stage = Some(stage);
        err.retryable = true;
        err.retry_after = Some(Duration::from_secs(5));
        err
    }

    /// Wraps a collaborator failure as an external error.
    pub fn wrap_external(
        service: &str,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::external(
            format!("{}_ERROR", service.to_uppercase()),
            format!("{service} service error"),
        )
        .with_cause(cause)
    }

    /// Error returned when a workflow observes its cancellation token.
    pub fn cancelled(workflow_id: &str) -> Self {
        let mut err = Self::new(
            ErrorKind::Internal,
            "WORKFLOW_CANCELLED",
            "workflow was cancelled",
        );
        err.workflow_id = Some(workflow_id.to_string());
        err
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(cause));
        self
    }

    pub fn with_context(
        mut self,
        request_id: impl Into<String>,
        workflow_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        self.request_id = Some(request_id.into());
        self.workflow_id = Some(workflow_id.into());
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        self.retryable = true;
        self.retry_after = Some(delay);
        self
    }

    pub fn is_cancellation(&self) -> bool {
        self.code == "WORKFLOW_CANCELLED"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_kind_and_retry_policy() {
        let v = NewsmithError::validation("QUERY_EMPTY", "query must not be empty");
        assert_eq!(v.kind, ErrorKind::Validation);
        assert!(!v.retryable);

        let e = NewsmithError::external("NEWS_ERROR", "news service error");
        assert_eq!(e.kind, ErrorKind::External);
        assert!(e.retryable);
        assert_eq!(e.retry_after, Some(Duration::from_secs(3)));

        let t = NewsmithError::timeout("STAGE_TIMEOUT", "stage timed out");
        assert_eq!(t.kind, ErrorKind::Timeout);
        assert!(t.retryable);
    }

    #[test]
    fn agent_error_derives_code_and_stage() {
        let err = NewsmithError::agent("keyword_extractor", "extraction failed");
        assert_eq!(err.code, "KEYWORD_EXTRACTOR_AGENT_ERROR");
        assert_eq!(err.stage.as_deref(), Some("keyword_extractor"));
        assert_eq!(err.kind, ErrorKind::Agent);
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = NewsmithError::not_found("WORKFLOW_NOT_FOUND", "workflow not found");
        assert_eq!(err.to_string(), "WORKFLOW_NOT_FOUND: workflow not found");
    }

    #[test]
    fn context_builder_attaches_ids() {
        let err = NewsmithError::internal("X", "y").with_context("req-1", "wf-1", "user-1");
        assert_eq!(err.request_id.as_deref(), Some("req-1"));
        assert_eq!(err.workflow_id.as_deref(), Some("wf-1"));
        assert_eq!(err.user_id.as_deref(), Some("user-1"));
    }

    #[test]
    fn cancellation_is_detectable() {
        let err = NewsmithError::cancelled("wf-9");
        assert!(err.is_cancellation());
        assert_eq!(err.workflow_id.as_deref(), Some("wf-9"));
    }

    #[test]
    fn kind_round_trips_through_strings() {
        assert_eq!(ErrorKind::CircuitBreaker.to_string(), "circuit_breaker");
        assert_eq!(
            "rate_limit".parse::<ErrorKind>().unwrap(),
            ErrorKind::RateLimit
        );
    }
}
