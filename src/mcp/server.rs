//! MCP request handling shared by every session transport
//!
//! Transports hand raw inbound frames to [`McpServer::dispatch`] together
//! with the session's outbound queue. Cheap protocol requests are answered
//! inline, in arrival order; `tools/call` runs on its own task so that a
//! long audit never stalls the rest of the session.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::protocol::{
    decode, negotiate_version, CallToolParams, Incoming, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities,
    ServerInfo, ToolsCapability, PROTOCOL_VERSION,
};
use super::tools;
use crate::orchestrator::AuditService;

pub const SERVER_NAME: &str = "Lighthouse MCP Server";

/// MCP server over the shared [`AuditService`]
pub struct McpServer {
    service: Arc<AuditService>,
    info: ServerInfo,
}

impl McpServer {
    pub fn new(service: Arc<AuditService>) -> Self {
        Self {
            service,
            info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    pub fn service(&self) -> &Arc<AuditService> {
        &self.service
    }

    /// Decode one raw frame and queue any reply on `outbound`.
    pub async fn dispatch(self: &Arc<Self>, raw: &str, outbound: &mpsc::Sender<String>) {
        let request = match decode(raw) {
            Ok(Incoming::Request(request)) => request,
            Ok(Incoming::Response(_)) => {
                tracing::debug!("Ignoring JSON-RPC response from client");
                return;
            }
            Err(response) => {
                tracing::warn!("Rejected malformed MCP message");
                send(outbound, &response).await;
                return;
            }
        };

        if request.method == "tools/call" && !request.is_notification() {
            let server = Arc::clone(self);
            let outbound = outbound.clone();
            tokio::spawn(async move {
                if let Some(response) = server.handle(request).await {
                    send(&outbound, &response).await;
                }
            });
            return;
        }

        if let Some(response) = self.handle(request).await {
            send(outbound, &response).await;
        }
    }

    /// Handle a decoded request. Notifications yield `None`.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "MCP notification");
            return None;
        }

        if let Some(id) = &request.id {
            tracing::debug!(method = %request.method, id = %id, "MCP request");
        }

        let outcome = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => to_value(&ListToolsResult {
                tools: tools::definitions(),
            }),
            "tools/call" => self.call_tool(request.params).await,
            method => Err(JsonRpcError::method_not_found(method)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(error) => JsonRpcResponse::failure(request.id, error),
        })
    }

    fn initialize(
        &self,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, JsonRpcError> {
        let version = match params {
            Some(params) => {
                let params: InitializeParams = serde_json::from_value(params)
                    .map_err(|e| JsonRpcError::invalid_params(format!("Invalid initialize params: {e}")))?;
                if let Some(client) = &params.client_info {
                    tracing::info!(client = %client.name, version = %client.version, "MCP client connected");
                }
                negotiate_version(&params.protocol_version)
            }
            None => PROTOCOL_VERSION,
        };

        to_value(&InitializeResult {
            protocol_version: version.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: self.info.clone(),
        })
    }

    async fn call_tool(
        &self,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, JsonRpcError> {
        let params: CallToolParams = params
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params for tools/call"))
            .and_then(|p| {
                serde_json::from_value(p)
                    .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tools/call params: {e}")))
            })?;

        tracing::info!(tool = %params.name, "Calling tool");
        let result = tools::call(&self.service, &params.name, params.arguments).await?;
        to_value(&result)
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| {
        JsonRpcError::new(super::protocol::INTERNAL_ERROR, format!("Serialization failed: {e}"))
    })
}

async fn send(outbound: &mpsc::Sender<String>, response: &JsonRpcResponse) {
    match serde_json::to_string(response) {
        Ok(frame) => {
            if outbound.send(frame).await.is_err() {
                tracing::debug!("Session closed before response could be sent");
            }
        }
        Err(e) => tracing::error!("Failed to serialize MCP response: {e}"),
    }
}
