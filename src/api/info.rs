use axum::Json;

use crate::api::types::InfoResponse;

pub const INFO_MESSAGE: &str =
    "Lighthouse MCP server running - POST /audit { \"url\": \"https://...\" }";

/// Catch-all for unmatched routes and methods.
pub async fn handler() -> Json<InfoResponse> {
    Json(InfoResponse {
        message: INFO_MESSAGE.to_string(),
    })
}
