//! Stdio Transport for MCP
//!
//! Newline-delimited JSON-RPC over a reader/writer pair (the process's own
//! stdin/stdout in production). The session counts as established once the
//! peer's first frame arrives; it then runs until the peer closes its end.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::sync::mpsc;

use crate::error::{LighthouseError, Result};
use crate::mcp::McpServer;

/// Outbound queue depth
const OUTBOUND_CAPACITY: usize = 100;

/// An established stdio session
pub struct StdioSession<R, W> {
    lines: Lines<BufReader<R>>,
    writer: W,
    first_frame: String,
}

impl<R, W> StdioSession<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Wait for the peer's first frame. Fails if the reader hits EOF or an
    /// I/O error before anything arrives.
    pub async fn establish(reader: R, writer: W) -> Result<Self> {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => {
                    tracing::info!("Stdio session established");
                    return Ok(Self {
                        lines,
                        writer,
                        first_frame: line,
                    });
                }
                None => {
                    return Err(LighthouseError::Transport(
                        "stdin closed before the session was established".to_string(),
                    ))
                }
            }
        }
    }

    /// Serve the session until the peer closes stdin. In-flight tool calls
    /// are allowed to finish and flush before this returns.
    pub async fn serve(self, server: Arc<McpServer>) -> Result<()> {
        let Self {
            mut lines,
            writer,
            first_frame,
        } = self;

        let (outbound_tx, outbound_rx) = mpsc::channel::<String>(OUTBOUND_CAPACITY);
        let writer_task = tokio::spawn(write_frames(writer, outbound_rx));

        server.dispatch(&first_frame, &outbound_tx).await;

        let read_result = loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        server.dispatch(trimmed, &outbound_tx).await;
                    }
                }
                Ok(None) => {
                    tracing::info!("Stdio peer closed the session");
                    break Ok(());
                }
                Err(e) => {
                    tracing::error!("Failed to read MCP stdin: {e}");
                    break Err(LighthouseError::Io(e));
                }
            }
        };

        drop(outbound_tx);
        if let Err(e) = writer_task.await {
            tracing::error!("Stdio writer task failed: {e}");
        }

        read_result
    }
}

async fn write_frames<W: AsyncWrite + Unpin>(mut writer: W, mut rx: mpsc::Receiver<String>) {
    while let Some(frame) = rx.recv().await {
        if let Err(e) = writer.write_all(frame.as_bytes()).await {
            tracing::error!("Failed to write to MCP stdout: {e}");
            break;
        }
        if let Err(e) = writer.write_all(b"\n").await {
            tracing::error!("Failed to write to MCP stdout: {e}");
            break;
        }
        if let Err(e) = writer.flush().await {
            tracing::error!("Failed to flush MCP stdout: {e}");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use crate::orchestrator::AuditService;
    use tokio::io::{duplex, AsyncReadExt};

    fn server() -> Arc<McpServer> {
        let service = Arc::new(AuditService::new(Arc::new(MockEngine::new())));
        Arc::new(McpServer::new(service))
    }

    #[tokio::test]
    async fn test_establish_fails_on_immediate_eof() {
        let (client, server_side) = duplex(1024);
        drop(client);
        let (reader, writer) = tokio::io::split(server_side);
        let result = StdioSession::establish(reader, writer).await;
        assert!(matches!(result, Err(LighthouseError::Transport(_))));
    }

    #[tokio::test]
    async fn test_establish_skips_blank_lines() {
        let (mut client, server_side) = duplex(1024);
        client.write_all(b"\n  \n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n").await.unwrap();
        let (reader, writer) = tokio::io::split(server_side);
        let session = StdioSession::establish(reader, writer).await.unwrap();
        assert!(session.first_frame.contains("ping"));
    }

    #[tokio::test]
    async fn test_serve_answers_each_line() {
        let (client, server_side) = duplex(64 * 1024);
        let (client_read, mut client_write) = tokio::io::split(client);
        let (reader, writer) = tokio::io::split(server_side);

        client_write
            .write_all(
                concat!(
                    r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{}}}"#,
                    "\n",
                    r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                    "\n",
                    r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
                    "\n",
                )
                .as_bytes(),
            )
            .await
            .unwrap();

        let session = StdioSession::establish(reader, writer).await.unwrap();
        let serve = tokio::spawn(session.serve(server()));

        let mut replies = BufReader::new(client_read).lines();
        let first: serde_json::Value =
            serde_json::from_str(&replies.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(first["id"], 1);
        assert_eq!(first["result"]["protocolVersion"], "2024-11-05");

        let second: serde_json::Value =
            serde_json::from_str(&replies.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(second["id"], 2);
        assert!(second["result"]["tools"].is_array());

        client_write.shutdown().await.unwrap();
        serve.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_serve_flushes_inflight_audit_on_close() {
        let (client, server_side) = duplex(64 * 1024);
        let (mut client_read, mut client_write) = tokio::io::split(client);
        let (reader, writer) = tokio::io::split(server_side);

        client_write
            .write_all(
                concat!(
                    r#"{"jsonrpc":"2.0","id":"run","method":"tools/call","params":{"name":"lighthouse_run_audit","arguments":{"url":"https://a.dev"}}}"#,
                    "\n"
                )
                .as_bytes(),
            )
            .await
            .unwrap();
        client_write.shutdown().await.unwrap();

        let session = StdioSession::establish(reader, writer).await.unwrap();
        session.serve(server()).await.unwrap();

        let mut out = String::new();
        client_read.read_to_string(&mut out).await.unwrap();
        let reply: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(reply["id"], "run");
        assert_eq!(reply["result"]["isError"], false);
    }
}
