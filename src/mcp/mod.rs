//! MCP (Model Context Protocol) server
//!
//! Exposes the audit service to MCP clients as two tools:
//!
//! | Tool | Purpose |
//! |------|---------|
//! | `lighthouse_run_audit` | Audit a URL and store the report |
//! | `lighthouse_get_report` | Fetch a stored report by id |
//!
//! The server is transport-agnostic: the SSE session hub and the stdio
//! session both feed raw JSON-RPC frames into [`McpServer::dispatch`].

pub mod protocol;
pub mod server;
pub mod tools;

pub use protocol::{
    CallToolResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpTool, RequestId,
    ToolContent, PROTOCOL_VERSION,
};
pub use server::McpServer;
