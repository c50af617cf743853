//! Error types for a3s-lighthouse

use thiserror::Error;

/// Errors that can occur while auditing pages or serving sessions
#[derive(Debug, Error)]
pub enum LighthouseError {
    /// Audit request carried no URL
    #[error("missing url")]
    MissingUrl,

    /// No stored report under the given id
    #[error("Report not found: {0}")]
    ReportNotFound(String),

    /// The audit engine failed (browser launch, navigation, crash)
    #[error("{0}")]
    Engine(String),

    /// Malformed request payload from a caller
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Session transport failure (handshake, body read, closed pipe)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Listener or server lifecycle failure
    #[error("Server error: {0}")]
    Server(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for lighthouse operations
pub type Result<T> = std::result::Result<T, LighthouseError>;

impl From<LighthouseError> for axum::response::Response {
    fn from(err: LighthouseError) -> Self {
        use axum::http::StatusCode;
        use axum::response::IntoResponse;

        let status = match &err {
            LighthouseError::MissingUrl | LighthouseError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            LighthouseError::ReportNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "error": err.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
