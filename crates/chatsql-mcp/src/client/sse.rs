//! SSE transport (legacy MCP HTTP+SSE)
//!
//! A long-lived `GET` carries server-to-client events. The first `endpoint`
//! event names the URL that requests are `POST`ed to; responses come back
//! as `message` events and are routed to their waiter by JSON-RPC id.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt;
use parking_lot::Mutex;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use url::Url;

use super::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, parse_response};
use super::transport::Transport;
use crate::config::{SseConfig, TransportKind};
use crate::error::{McpError, McpResult};

/// One decoded server-sent event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    /// `event:` field; `None` means the default `message` type
    pub event: Option<String>,
    /// `data:` lines joined with `\n`
    pub data: String,
    /// `id:` field
    pub id: Option<String>,
}

/// Incremental `text/event-stream` decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    // bytes of a UTF-8 sequence cut by a chunk boundary
    partial: Vec<u8>,
}

impl SseDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes from the network and return every event they complete
    ///
    /// A multibyte character split across chunks is held back until the
    /// rest of it arrives.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.partial.extend_from_slice(chunk);
        let complete = match std::str::from_utf8(&self.partial) {
            Ok(_) => self.partial.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            // invalid bytes, not a truncated sequence
            Err(_) => self.partial.len(),
        };
        let bytes: Vec<u8> = self.partial.drain(..complete).collect();
        self.push(&String::from_utf8_lossy(&bytes))
    }

    /// Feed a chunk and return every event it completes
    pub fn push(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.buffer.push_str(chunk);
        if self.buffer.contains("\r\n") {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find("\n\n") {
            let block: String = self.buffer.drain(..pos + 2).collect();
            if let Some(event) = parse_block(&block) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing event not terminated by a blank line
    pub fn finish(&mut self) -> Option<SseEvent> {
        if !self.partial.is_empty() {
            let tail = std::mem::take(&mut self.partial);
            self.buffer.push_str(&String::from_utf8_lossy(&tail));
        }
        let block = std::mem::take(&mut self.buffer);
        parse_block(&block)
    }
}

fn parse_block(block: &str) -> Option<SseEvent> {
    let mut event = SseEvent::default();
    let mut data = Vec::new();

    for line in block.lines() {
        // comment / keep-alive
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.find(':') {
            Some(pos) => (&line[..pos], line[pos + 1..].strip_prefix(' ').unwrap_or(&line[pos + 1..])),
            None => (line, ""),
        };
        match field {
            "event" => event.event = Some(value.to_string()),
            "data" => data.push(value),
            "id" => event.id = Some(value.to_string()),
            _ => {}
        }
    }

    if data.is_empty() && event.event.is_none() {
        return None;
    }
    event.data = data.join("\n");
    Some(event)
}

/// Parse a JSON-RPC response carried by an event, if it is one
pub(crate) fn event_response(event: &SseEvent) -> Option<JsonRpcResponse> {
    if !matches!(event.event.as_deref(), None | Some("message")) || event.data.trim().is_empty() {
        return None;
    }
    let value: Value = serde_json::from_str(&event.data).ok()?;
    parse_response(value)
}

/// Resolve the `endpoint` event payload against the stream URL
///
/// The payload is either a (possibly relative) URL or `{"uri": "..."}`.
pub(crate) fn resolve_endpoint(base: &Url, data: &str) -> McpResult<Url> {
    let data = data.trim();
    let target = if data.starts_with('{') {
        let parsed: Value = serde_json::from_str(data)?;
        parsed
            .get("uri")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| McpError::transport("endpoint event missing 'uri'"))?
    } else {
        data.to_string()
    };

    base.join(&target)
        .map_err(|e| McpError::transport(format!("invalid endpoint '{target}': {e}")))
}

pub(crate) fn header_map(headers: &HashMap<String, String>) -> McpResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| McpError::configuration(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| McpError::configuration(format!("invalid header value for '{name}': {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

type Pending = Arc<DashMap<u64, oneshot::Sender<JsonRpcResponse>>>;

struct Session {
    message_url: Url,
    reader: JoinHandle<()>,
}

/// Removes a pending waiter when its request future is dropped
struct PendingGuard<'a> {
    pending: &'a Pending,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

/// SSE transport
pub struct SseTransport {
    server: String,
    endpoint: String,
    headers: HeaderMap,
    http: reqwest::Client,
    pending: Pending,
    session: Mutex<Option<Session>>,
}

impl std::fmt::Debug for SseTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseTransport")
            .field("server", &self.server)
            .field("endpoint", &self.endpoint)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl SseTransport {
    /// Create a transport for `config` (no connection is made)
    ///
    /// # Errors
    ///
    /// Returns `McpError::Configuration` for invalid headers and
    /// `McpError::Connection` if the HTTP client cannot be built.
    pub fn new(server: impl Into<String>, config: &SseConfig) -> McpResult<Self> {
        let server = server.into();
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| McpError::connection_to(&server, format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            headers: header_map(&config.headers)?,
            endpoint: config.endpoint.clone(),
            server,
            http,
            pending: Arc::new(DashMap::new()),
            session: Mutex::new(None),
        })
    }

    fn message_url(&self) -> McpResult<Url> {
        self.session
            .lock()
            .as_ref()
            .map(|s| s.message_url.clone())
            .ok_or_else(|| McpError::NotConnected {
                server: self.server.clone(),
            })
    }

    async fn post(&self, body: &impl serde::Serialize) -> McpResult<()> {
        let url = self.message_url()?;
        let response = self
            .http
            .post(url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(format!("POST failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.transport_error(format!("HTTP error {status}: {body}")));
        }
        Ok(())
    }

    fn transport_error(&self, message: String) -> McpError {
        McpError::Transport {
            message,
            server: Some(self.server.clone()),
        }
    }
}

async fn read_stream(
    server: String,
    response: reqwest::Response,
    base: Url,
    pending: Pending,
    endpoint_tx: oneshot::Sender<McpResult<Url>>,
) {
    let mut endpoint_tx = Some(endpoint_tx);
    let mut decoder = SseDecoder::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(server = %server, "SSE stream error: {e}");
                break;
            }
        };

        for event in decoder.push_bytes(&chunk) {
            if event.event.as_deref() == Some("endpoint") {
                let resolved = resolve_endpoint(&base, &event.data);
                if let Some(tx) = endpoint_tx.take() {
                    let _ = tx.send(resolved);
                }
                continue;
            }

            match event_response(&event) {
                Some(response) => match response.id_u64().and_then(|id| pending.remove(&id)) {
                    Some((_, waiter)) => {
                        let _ = waiter.send(response);
                    }
                    None => debug!(server = %server, "Dropping response with no waiter"),
                },
                None => trace!(server = %server, event = ?event.event, "Ignoring SSE event"),
            }
        }
    }

    if let Some(tx) = endpoint_tx.take() {
        let _ = tx.send(Err(McpError::connection_to(
            &server,
            "SSE stream closed before endpoint event",
        )));
    }
    // wake every waiter with a closed channel
    pending.clear();
    debug!(server = %server, "SSE stream ended");
}

#[async_trait]
impl Transport for SseTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Sse
    }

    async fn connect(&self) -> McpResult<()> {
        let base = Url::parse(&self.endpoint)
            .map_err(|e| McpError::connection_to(&self.server, format!("invalid endpoint: {e}")))?;
        if matches!(base.scheme(), "ws" | "wss") {
            return Err(McpError::connection_to(
                &self.server,
                format!("WebSocket endpoint '{}' is not supported by the SSE transport", self.endpoint),
            ));
        }

        let response = self
            .http
            .get(base.clone())
            .headers(self.headers.clone())
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| McpError::connection_to(&self.server, format!("SSE connection failed: {e}")))?;

        if !response.status().is_success() {
            return Err(McpError::connection_to(
                &self.server,
                format!("SSE connection failed: HTTP {}", response.status()),
            ));
        }

        let (endpoint_tx, endpoint_rx) = oneshot::channel();
        let reader = tokio::spawn(read_stream(
            self.server.clone(),
            response,
            base,
            Arc::clone(&self.pending),
            endpoint_tx,
        ));

        let message_url = match endpoint_rx.await {
            Ok(Ok(url)) => url,
            Ok(Err(e)) => {
                reader.abort();
                return Err(e);
            }
            Err(_) => {
                reader.abort();
                return Err(McpError::connection_to(&self.server, "SSE reader stopped"));
            }
        };

        info!(server = %self.server, endpoint = %message_url, "Discovered message endpoint");
        if let Some(old) = self.session.lock().replace(Session { message_url, reader }) {
            old.reader.abort();
        }
        Ok(())
    }

    async fn request(&self, request: JsonRpcRequest) -> McpResult<JsonRpcResponse> {
        let id = request.id;
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        let _guard = PendingGuard {
            pending: &self.pending,
            id,
        };

        self.post(&request).await?;

        rx.await
            .map_err(|_| self.transport_error("SSE stream closed while awaiting response".to_string()))
    }

    async fn notify(&self, notification: JsonRpcNotification) -> McpResult<()> {
        self.post(&notification).await
    }

    async fn close(&self) -> McpResult<()> {
        if let Some(session) = self.session.lock().take() {
            session.reader.abort();
        }
        self.pending.clear();
        Ok(())
    }
}

impl Drop for SseTransport {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            session.reader.abort();
        }
    }
}
