//! Transport selection at startup
//!
//! When both stdin and stdout are pipes the process was most likely spawned
//! by an MCP client, so it first tries to serve MCP over stdio. The stdio
//! session counts as established once the client's first frame arrives; if
//! stdin closes before that, the process falls back to the HTTP/SSE server.
//! When the streams are not piped the HTTP/SSE server starts directly.

use std::io::IsTerminal;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::server::{self, AppState};
use crate::transport::StdioSession;

/// Decides whether the process looks like it was launched over pipes.
pub trait PipeProbe: Send + Sync {
    fn is_piped(&self) -> bool;
}

/// Probes the real stdin/stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalProbe;

impl PipeProbe for TerminalProbe {
    fn is_piped(&self) -> bool {
        !std::io::stdin().is_terminal() && !std::io::stdout().is_terminal()
    }
}

impl<F> PipeProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_piped(&self) -> bool {
        self()
    }
}

/// Which surface the process ends up serving
pub enum Launch<R, W> {
    Stdio(StdioSession<R, W>),
    Http,
}

impl<R, W> Launch<R, W> {
    pub fn is_stdio(&self) -> bool {
        matches!(self, Launch::Stdio(_))
    }
}

/// Pick the transport. `piped` is the probe's verdict, taken once at startup.
pub async fn select_transport<R, W>(piped: bool, reader: R, writer: W) -> Launch<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    if !piped {
        return Launch::Http;
    }

    match StdioSession::establish(reader, writer).await {
        Ok(session) => Launch::Stdio(session),
        Err(e) => {
            tracing::warn!("Stdio session not established ({e}), falling back to HTTP");
            Launch::Http
        }
    }
}

/// Serve on the selected transport until it finishes.
pub async fn run(state: AppState, piped: bool) -> Result<()> {
    match select_transport(piped, tokio::io::stdin(), tokio::io::stdout()).await {
        Launch::Stdio(session) => {
            tracing::info!("Serving MCP over stdio");
            session.serve(state.mcp.clone()).await
        }
        Launch::Http => {
            println!("A3S Lighthouse server starting...");
            println!("Listening on http://{}", state.config.bind_address());
            println!("Press Ctrl+C to stop");
            server::start(state).await
        }
    }
}
