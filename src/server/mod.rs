pub mod router;
pub mod state;

use crate::error::{LighthouseError, Result};

pub use state::AppState;

/// Serve the HTTP/SSE surface until the listener fails.
pub async fn start(state: AppState) -> Result<()> {
    let bind_addr = state.config.bind_address();
    tracing::info!(engine = state.service.engine_name(), "Initialized audit service");

    let app = router::build(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| LighthouseError::Server(format!("Failed to bind to {bind_addr}: {e}")))?;

    tracing::info!("Server listening on {bind_addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| LighthouseError::Server(format!("Server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::engine::MockEngine;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_start_fails_when_port_taken() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let config = ServerConfig {
            port,
            ..ServerConfig::default()
        };
        let state = AppState::new(Arc::new(MockEngine::new()), Arc::new(config));

        let err = start(state).await.unwrap_err();
        assert!(matches!(err, LighthouseError::Server(_)));
        assert!(err.to_string().contains("Failed to bind"));
    }
}
