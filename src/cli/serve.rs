use std::sync::Arc;

use crate::bootstrap;
use crate::config::ServerConfig;
use crate::engine::LighthouseEngine;
use crate::error::Result;
use crate::server::AppState;

/// Start serving: stdio when `piped` and a client speaks first, HTTP/SSE otherwise.
pub async fn execute(config: ServerConfig, piped: bool) -> Result<()> {
    let engine = Arc::new(LighthouseEngine::with_command(config.lighthouse_command.clone()));
    tracing::info!(command = %engine.command(), "Using Lighthouse launcher");

    let state = AppState::new(engine, Arc::new(config));
    bootstrap::run(state, piped).await
}
