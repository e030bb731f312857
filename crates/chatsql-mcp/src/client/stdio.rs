//! Stdio transport
//!
//! Spawns the server as a child process and exchanges newline-delimited
//! JSON-RPC over its stdin/stdout. One request is in flight at a time.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, error, info, trace, warn};

use super::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, parse_response};
use super::transport::Transport;
use crate::config::{StdioConfig, TransportKind};
use crate::error::{McpError, McpResult};

/// Largest accepted line from the child, in bytes
const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// One line of child output
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    Line(String),
    /// Discarded line longer than the limit, with its length
    Oversized(usize),
}

/// Read one `\n`-terminated line, buffering at most `limit` bytes of it
///
/// The remainder of an oversized line is consumed and dropped. Returns
/// `None` at end of stream.
async fn read_frame<R>(reader: &mut R, limit: usize) -> std::io::Result<Option<Frame>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let mut len = 0usize;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            if len == 0 {
                return Ok(None);
            }
            break;
        }

        let newline = available.iter().position(|&b| b == b'\n');
        let chunk = &available[..newline.unwrap_or(available.len())];
        len += chunk.len();
        if len <= limit {
            line.extend_from_slice(chunk);
        } else {
            line = Vec::new();
        }

        let used = newline.map_or(available.len(), |i| i + 1);
        reader.consume(used);
        if newline.is_some() {
            break;
        }
    }

    Ok(Some(if len > limit {
        Frame::Oversized(len)
    } else {
        Frame::Line(String::from_utf8_lossy(&line).into_owned())
    }))
}

struct ChildIo {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl ChildIo {
    async fn write_line(&mut self, message: &impl Serialize) -> McpResult<()> {
        let line = serde_json::to_string(message)?;
        trace!("Sending to child process: {line}");
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }
}

/// Stdio transport
pub struct StdioTransport {
    server: String,
    config: StdioConfig,
    io: Mutex<Option<ChildIo>>,
}

impl std::fmt::Debug for StdioTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioTransport")
            .field("server", &self.server)
            .field("command", &self.config.command)
            .field("args", &self.config.args)
            .finish_non_exhaustive()
    }
}

impl StdioTransport {
    /// Create a transport for `config` (the process is spawned on `connect`)
    pub fn new(server: impl Into<String>, config: StdioConfig) -> Self {
        Self {
            server: server.into(),
            config,
            io: Mutex::new(None),
        }
    }

    fn spawn(&self) -> McpResult<ChildIo> {
        info!(
            server = %self.server,
            "Starting child process: {} {:?}", self.config.command, self.config.args
        );

        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .envs(&self.config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref cwd) = self.config.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| {
            error!(server = %self.server, "Failed to spawn child process: {e}");
            McpError::connection_to(&self.server, format!("Failed to spawn '{}': {e}", self.config.command))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::connection_to(&self.server, "Failed to get stdin handle"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::connection_to(&self.server, "Failed to get stdout handle"))?;

        if let Some(stderr) = child.stderr.take() {
            let server = self.server.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(server = %server, "Child process stderr: {line}");
                }
            });
        }

        Ok(ChildIo {
            child,
            stdin: BufWriter::new(stdin),
            stdout: BufReader::new(stdout),
        })
    }

    fn closed(&self) -> McpError {
        McpError::Transport {
            message: "child process closed its output".to_string(),
            server: Some(self.server.clone()),
        }
    }
}

#[async_trait]
impl Transport for StdioTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Stdio
    }

    async fn connect(&self) -> McpResult<()> {
        let mut io = self.io.lock().await;
        if io.is_none() {
            *io = Some(self.spawn()?);
        }
        Ok(())
    }

    async fn request(&self, request: JsonRpcRequest) -> McpResult<JsonRpcResponse> {
        let mut guard = self.io.lock().await;
        let io = guard.as_mut().ok_or_else(|| McpError::NotConnected {
            server: self.server.clone(),
        })?;

        io.write_line(&request).await?;

        loop {
            let line = match read_frame(&mut io.stdout, MAX_MESSAGE_SIZE).await? {
                Some(Frame::Line(line)) => line,
                Some(Frame::Oversized(len)) => {
                    warn!(server = %self.server, "Skipping oversized message: {len} bytes");
                    continue;
                }
                None => return Err(self.closed()),
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Ok(value) = serde_json::from_str::<Value>(line) else {
                debug!(server = %self.server, "Skipping non-JSON output: {line}");
                continue;
            };
            match parse_response(value) {
                Some(response) if response.id_u64() == Some(request.id) => return Ok(response),
                // answer to a request abandoned after a timeout
                Some(response) => debug!(server = %self.server, id = ?response.id, "Skipping stale response"),
                None => trace!(server = %self.server, "Skipping notification"),
            }
        }
    }

    async fn notify(&self, notification: JsonRpcNotification) -> McpResult<()> {
        let mut guard = self.io.lock().await;
        let io = guard.as_mut().ok_or_else(|| McpError::NotConnected {
            server: self.server.clone(),
        })?;
        io.write_line(&notification).await
    }

    async fn close(&self) -> McpResult<()> {
        let Some(mut io) = self.io.lock().await.take() else {
            return Ok(());
        };
        drop(io.stdin);
        if let Err(e) = io.child.kill().await {
            warn!(server = %self.server, "Failed to kill child process: {e}");
        }
        debug!(server = %self.server, "Child process stopped");
        Ok(())
    }
}
