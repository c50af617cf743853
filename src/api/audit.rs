use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::types::{AuditBody, AuditResponse};
use crate::error::LighthouseError;
use crate::orchestrator::summarize;
use crate::server::state::AppState;

/// POST /audit - Run an audit and reply with its summary and a fix suggestion.
///
/// An empty body counts as `{}`. Engine failures still answer 200, with the
/// failure in `error`. The audit runs on its own task and is stored even if
/// the caller disconnects before it finishes.
pub async fn handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(bytes) => bytes,
        Err(e) => {
            return LighthouseError::Transport(format!("Failed to read request body: {e}")).into()
        }
    };

    let request = match parse_body(&body) {
        Ok(request) => request,
        Err(e) => return e.into(),
    };

    // Runs to completion even if the caller hangs up
    let service = Arc::clone(&state.service);
    let audit = request.to_request();
    let record = match tokio::spawn(async move { service.run_audit(&audit).await }).await {
        Ok(Ok(record)) => record,
        Ok(Err(e)) => return e.into(),
        Err(e) => return LighthouseError::Server(format!("Audit task failed: {e}")).into(),
    };

    let response = AuditResponse {
        summary: summarize(&record),
        fix: state.service.derive_fix(&record, request.only_failures),
        error: record.error.clone(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

fn parse_body(body: &[u8]) -> Result<AuditBody, LighthouseError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AuditBody::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| LighthouseError::InvalidRequest(format!("Invalid JSON body: {e}")))
}
