// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handlers for the workflow endpoints.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::Stream;
use newsmith_core::{ErrorKind, NewsmithError, WorkflowRequest};
use serde_json::json;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::warn;

use crate::server::GatewayState;

/// Maximum accepted query length, in characters.
const MAX_QUERY_CHARS: usize = 2000;

fn status_for(err: &NewsmithError) -> StatusCode {
    match err.kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Timeout => StatusCode::REQUEST_TIMEOUT,
        ErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::External => StatusCode::BAD_GATEWAY,
        ErrorKind::Unavailable | ErrorKind::CircuitBreaker => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal | ErrorKind::Agent => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_body(err: &NewsmithError) -> Json<serde_json::Value> {
    Json(json!({
        "error": {
            "type": err.kind.to_string(),
            "code": err.code,
            "message": err.message,
            "retryable": err.retryable,
        }
    }))
}

fn validate(request: &WorkflowRequest) -> Result<(), NewsmithError> {
    if request.user_id.trim().is_empty() {
        return Err(NewsmithError::validation(
            "INVALID_USER_ID",
            "user_id is required and must not be empty",
        ));
    }
    if request.query.trim().is_empty() {
        return Err(NewsmithError::validation(
            "QUERY_EMPTY",
            "query must not be empty",
        ));
    }
    if request.query.chars().count() > MAX_QUERY_CHARS {
        return Err(NewsmithError::validation(
            "QUERY_TOO_LONG",
            format!("query must be at most {MAX_QUERY_CHARS} characters"),
        ));
    }
    Ok(())
}

/// `POST /workflows/execute`
pub async fn execute_workflow(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<WorkflowRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    if let Err(err) = validate(&request) {
        return Err((status_for(&err), error_body(&err)));
    }
    let response = state.orchestrator.execute(request).await;
    Ok(Json(serde_json::to_value(response).unwrap_or_default()))
}

/// `GET /workflows/:id/status`
pub async fn workflow_status(
    State(state): State<Arc<GatewayState>>,
    Path(workflow_id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match state.orchestrator.get_status(&workflow_id).await {
        Ok(context) => Ok(Json(json!({
            "workflow_id": context.id,
            "request_id": context.request_id,
            "user_id": context.user_id,
            "status": context.status,
            "intent": context.intent,
            "is_follow_up": context.is_follow_up,
            "start_time": context.start_time,
            "end_time": context.end_time,
            "processing_stats": context.processing_stats,
        }))),
        Err(err) => Err((status_for(&err), error_body(&err))),
    }
}

/// `DELETE /workflows/:id`
pub async fn cancel_workflow(
    State(state): State<Arc<GatewayState>>,
    Path(workflow_id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match state.orchestrator.cancel(&workflow_id).await {
        Ok(()) => Ok(Json(json!({"workflow_id": workflow_id, "cancelled": true}))),
        Err(err) => Err((status_for(&err), error_body(&err))),
    }
}

/// `GET /workflows/active`
pub async fn active_workflows(State(state): State<Arc<GatewayState>>) -> Json<serde_json::Value> {
    Json(json!({"active_workflows": state.orchestrator.active_count()}))
}

/// `GET /health`
pub async fn health(State(state): State<Arc<GatewayState>>) -> Json<serde_json::Value> {
    Json(state.orchestrator.health())
}

/// `GET /metrics`
pub async fn metrics(State(state): State<Arc<GatewayState>>) -> Json<serde_json::Value> {
    let health = state.orchestrator.health();
    Json(json!({
        "service": "newsmith",
        "active_workflows": health["active_workflows"],
        "configured_stages": health["configured_stages"],
        "uptime_seconds": health["uptime_seconds"],
    }))
}

/// `DELETE /users/:id/conversation`
pub async fn clear_conversation(
    State(state): State<Arc<GatewayState>>,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match state.orchestrator.clear_conversation(&user_id).await {
        Ok(()) => Ok(Json(json!({"user_id": user_id, "cleared": true}))),
        Err(err) => Err((status_for(&err), error_body(&err))),
    }
}

/// `GET /users/:id/updates`: SSE tail of the user's progress stream.
pub async fn progress_updates(
    State(state): State<Arc<GatewayState>>,
    Path(user_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.progress.subscribe(&user_id);
    let stream = BroadcastStream::new(receiver).filter_map(|item| match item {
        Ok(update) => {
            let event = Event::default()
                .event(update.update_type.to_string())
                .data(serde_json::to_string(&update).unwrap_or_default());
            Some(Ok(event))
        }
        Err(lagged) => {
            warn!(error = %lagged, "progress subscriber lagged, oldest entries dropped");
            None
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsmith_core::UserPreferences;

    fn request(user_id: &str, query: &str) -> WorkflowRequest {
        WorkflowRequest {
            user_id: user_id.to_string(),
            query: query.to_string(),
            workflow_id: None,
            user_preferences: UserPreferences::default(),
        }
    }

    #[test]
    fn validation_rejects_empty_fields() {
        assert_eq!(
            validate(&request("", "q")).unwrap_err().code,
            "INVALID_USER_ID"
        );
        assert_eq!(
            validate(&request("u", "  ")).unwrap_err().code,
            "QUERY_EMPTY"
        );
        let long = "x".repeat(MAX_QUERY_CHARS + 1);
        assert_eq!(
            validate(&request("u", &long)).unwrap_err().code,
            "QUERY_TOO_LONG"
        );
        assert!(validate(&request("u", "why?")).is_ok());
    }

    #[test]
    fn status_codes_follow_error_kinds() {
        assert_eq!(
            status_for(&NewsmithError::validation("X", "y")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&NewsmithError::not_found("X", "y")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&NewsmithError::external("X", "y")),
            StatusCode::BAD_GATEWAY
        );
    }
}
