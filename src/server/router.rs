use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::state::AppState;
use crate::api;

/// Build the complete axum Router.
///
/// | Route | Methods |
/// |-------|---------|
/// | `/audit` | POST |
/// | `/sse` | GET opens a session, POST delivers a message |
/// | `/sse/*` | POST delivers a message |
/// | `/messages` | POST delivers a message |
///
/// Anything else, including other methods on those paths, gets the
/// informational message.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route(
            "/audit",
            post(api::audit::handler).fallback(api::info::handler),
        )
        .route(
            "/sse",
            get(api::sse::open)
                .post(api::sse::deliver)
                .fallback(api::info::handler),
        )
        .route(
            "/sse/*rest",
            post(api::sse::deliver).fallback(api::info::handler),
        )
        .route(
            "/messages",
            post(api::sse::deliver).fallback(api::info::handler),
        )
        .fallback(api::info::handler)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
