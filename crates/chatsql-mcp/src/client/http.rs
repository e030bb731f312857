//! HTTP transport
//!
//! Each JSON-RPC message is `POST`ed to the endpoint. The response body is
//! either the JSON-RPC response itself or a short `text/event-stream` whose
//! `data:` events carry it.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{self, HeaderMap};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use super::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, parse_response};
use super::sse::{SseDecoder, event_response, header_map};
use super::transport::Transport;
use crate::config::{HttpConfig, TransportKind};
use crate::error::{McpError, McpResult};

const SESSION_HEADER: &str = "Mcp-Session-Id";

/// HTTP transport
pub struct HttpTransport {
    server: String,
    endpoint: String,
    api_key: Option<SecretString>,
    headers: HeaderMap,
    http: reqwest::Client,
    session_id: RwLock<Option<String>>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("server", &self.server)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("session_id", &*self.session_id.read())
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a transport for `config`
    ///
    /// # Errors
    ///
    /// Returns `McpError::Configuration` for invalid headers and
    /// `McpError::Connection` if the HTTP client cannot be built.
    pub fn new(server: impl Into<String>, config: &HttpConfig) -> McpResult<Self> {
        let server = server.into();
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| McpError::connection_to(&server, format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            headers: header_map(&config.headers)?,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone().map(SecretString::from),
            server,
            http,
            session_id: RwLock::new(None),
        })
    }

    /// Session id assigned by the server, if any
    pub fn session_id(&self) -> Option<String> {
        self.session_id.read().clone()
    }

    async fn post(&self, body: &impl Serialize) -> McpResult<reqwest::Response> {
        let mut req = self
            .http
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .header(header::ACCEPT, "application/json, text/event-stream")
            .json(body);

        if let Some(ref key) = self.api_key {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", key.expose_secret()));
        }
        if let Some(sid) = self.session_id.read().clone() {
            req = req.header(SESSION_HEADER, sid);
        }

        let response = req
            .send()
            .await
            .map_err(|e| self.transport_error(format!("HTTP request failed: {e}")))?;

        if let Some(sid) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            *self.session_id.write() = Some(sid.to_string());
        }

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(self.transport_error(format!("HTTP error {status}: {body}")));
        }
        Ok(response)
    }

    fn transport_error(&self, message: String) -> McpError {
        McpError::Transport {
            message,
            server: Some(self.server.clone()),
        }
    }
}

fn is_event_stream(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/event-stream"))
}

/// Find the response to `id` in an event-stream body
fn response_from_events(body: &str, id: u64) -> Option<JsonRpcResponse> {
    let mut decoder = SseDecoder::new();
    let mut events = decoder.push(body);
    events.extend(decoder.finish());
    events
        .iter()
        .filter_map(event_response)
        .find(|r| r.id_u64() == Some(id))
}

#[async_trait]
impl Transport for HttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    async fn connect(&self) -> McpResult<()> {
        debug!(server = %self.server, endpoint = %self.endpoint, "HTTP transport ready");
        Ok(())
    }

    async fn request(&self, request: JsonRpcRequest) -> McpResult<JsonRpcResponse> {
        let id = request.id;
        trace!(server = %self.server, method = %request.method, id, "POST request");
        let response = self.post(&request).await?;

        if is_event_stream(&response) {
            let body = response
                .text()
                .await
                .map_err(|e| self.transport_error(format!("Failed to read event stream: {e}")))?;
            return response_from_events(&body, id)
                .ok_or_else(|| self.transport_error(format!("No response for request {id} in event stream")));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| self.transport_error(format!("Failed to parse JSON-RPC response: {e}")))?;
        parse_response(value).ok_or_else(|| self.transport_error("Body is not a JSON-RPC response".to_string()))
    }

    async fn notify(&self, notification: JsonRpcNotification) -> McpResult<()> {
        trace!(server = %self.server, method = %notification.method, "POST notification");
        self.post(&notification).await.map(|_| ())
    }

    async fn close(&self) -> McpResult<()> {
        self.session_id.write().take();
        Ok(())
    }
}
