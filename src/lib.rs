//! # a3s-lighthouse
//!
//! Lighthouse page audits for the A3S ecosystem, served to MCP clients.
//!
//! ## Overview
//!
//! `a3s-lighthouse` runs Lighthouse against a URL, keeps every report in an
//! in-memory store under a `rpt-` id, and exposes audits over three surfaces
//! that share one [`AuditService`]:
//!
//! - **HTTP** - `POST /audit` returns a compact summary and a fix suggestion
//! - **SSE** - `GET /sse` plus `POST /messages` carry MCP JSON-RPC
//! - **stdio** - newline-delimited MCP JSON-RPC when launched over pipes
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use a3s_lighthouse::{summarize, AuditRequest, AuditService, MockEngine};
//!
//! # async fn example() -> a3s_lighthouse::Result<()> {
//! let service = AuditService::new(Arc::new(MockEngine::new()));
//!
//! let record = service.run_audit(&AuditRequest::new("https://example.com")).await?;
//! let summary = summarize(&record);
//!
//! println!("{} performance: {:?}", summary.url, summary.performance);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **AuditEngine** trait - runs one audit (Lighthouse CLI, or a mock in tests)
//! - **AuditService** - validates, runs, stores, summarizes
//! - **ReportStore** - id-keyed, insert-only report storage
//! - **McpServer** - JSON-RPC dispatch shared by the SSE and stdio sessions
//! - **SessionHub** - active SSE session plus the pending-delivery buffer

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod fix;
pub mod mcp;
pub mod orchestrator;
pub mod server;
pub mod store;
pub mod transport;
pub mod types;

// Re-export core types
pub use config::ServerConfig;
pub use engine::{AuditEngine, LighthouseEngine, MockEngine};
pub use error::{LighthouseError, Result};
pub use fix::{BaselineFixer, FixHeuristic, FixSuggestion};
pub use mcp::McpServer;
pub use orchestrator::{summarize, AuditService};
pub use server::AppState;
pub use store::ReportStore;
pub use transport::{SessionHub, StdioSession};
pub use types::{AuditRecord, AuditRequest, FormFactor, Summary};
