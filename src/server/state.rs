use std::sync::Arc;

use crate::config::ServerConfig;
use crate::engine::AuditEngine;
use crate::mcp::McpServer;
use crate::orchestrator::AuditService;
use crate::transport::SessionHub;

/// Shared application state, handed to every transport adapter.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AuditService>,
    pub mcp: Arc<McpServer>,
    pub sessions: Arc<SessionHub>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(engine: Arc<dyn AuditEngine>, config: Arc<ServerConfig>) -> Self {
        let service = Arc::new(AuditService::new(engine));
        Self::with_service(service, config)
    }

    pub fn with_service(service: Arc<AuditService>, config: Arc<ServerConfig>) -> Self {
        Self {
            mcp: Arc::new(McpServer::new(Arc::clone(&service))),
            service,
            sessions: Arc::new(SessionHub::new()),
            config,
        }
    }
}
