//! MCP method set over any transport

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, trace};

use super::jsonrpc::{JsonRpcNotification, JsonRpcRequest, PROTOCOL_VERSION};
use super::transport::Transport;
use super::{McpClient, ResourceInfo, ToolInfo};
use crate::config::TransportKind;
use crate::error::{McpError, McpResult};

/// Upper bound on pages followed by one listing call
const MAX_PAGES: usize = 1_000;

/// Identity sent in the `initialize` handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Client name
    pub name: String,
    /// Client version
    pub version: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            name: "chatsql-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// MCP client over a transport `T`
///
/// Each request is bounded by `timeout`.
pub struct ProtocolClient<T: Transport> {
    server: String,
    transport: T,
    timeout: Duration,
    client_info: ClientInfo,
    next_id: AtomicU64,
    connected: AtomicBool,
}

impl<T: Transport> std::fmt::Debug for ProtocolClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolClient")
            .field("server", &self.server)
            .field("transport", &self.transport.kind())
            .field("timeout", &self.timeout)
            .field("connected", &self.connected.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<T: Transport> ProtocolClient<T> {
    /// Create a client (not connected)
    pub fn new(server: impl Into<String>, transport: T, timeout: Duration, client_info: ClientInfo) -> Self {
        Self {
            server: server.into(),
            transport,
            timeout,
            client_info,
            next_id: AtomicU64::new(1),
            connected: AtomicBool::new(false),
        }
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn ensure_connected(&self) -> McpResult<()> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(McpError::NotConnected {
                server: self.server.clone(),
            })
        }
    }

    /// Send one request and return its result
    ///
    /// # Errors
    ///
    /// Returns `McpError::Timeout` when no response arrives in time and
    /// `McpError::Protocol` when the server answers with an error object.
    pub async fn request(&self, method: &str, params: Option<Value>) -> McpResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);
        trace!(server = %self.server, method, id, "Sending request");

        let response = tokio::time::timeout(self.timeout, self.transport.request(request))
            .await
            .map_err(|_| McpError::timeout(method, self.timeout_ms()))??;

        trace!(server = %self.server, method, id, "Received response");
        response.into_result()
    }

    async fn request_typed<R: DeserializeOwned>(&self, method: &str, params: Option<Value>) -> McpResult<R> {
        let value = self.request(method, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Follow `nextCursor` until the listing is exhausted
    async fn list_paginated<I: DeserializeOwned>(&self, method: &str, field: &str) -> McpResult<Vec<I>> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let mut page = self.request(method, params).await?;

            if let Some(list) = page.get_mut(field).map(Value::take) {
                let batch: Vec<I> = serde_json::from_value(list)?;
                items.extend(batch);
            }

            cursor = page
                .get("nextCursor")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
                .map(str::to_string);
            if cursor.is_none() {
                return Ok(items);
            }
        }

        Err(McpError::Discovery {
            message: format!("{method} did not terminate after {MAX_PAGES} pages"),
            server: Some(self.server.clone()),
        })
    }
}

#[async_trait]
impl<T: Transport> McpClient for ProtocolClient<T> {
    fn server_name(&self) -> &str {
        &self.server
    }

    fn transport(&self) -> TransportKind {
        self.transport.kind()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn connect(&self) -> McpResult<()> {
        if self.is_connected() {
            return Ok(());
        }

        debug!(server = %self.server, transport = %self.transport.kind(), "Connecting");
        tokio::time::timeout(self.timeout, self.transport.connect())
            .await
            .map_err(|_| McpError::timeout("connect", self.timeout_ms()))??;

        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": self.client_info.name,
                "version": self.client_info.version,
            }
        });

        let result = match self.request("initialize", Some(params)).await {
            Ok(result) => result,
            Err(e) => {
                let _ = self.transport.close().await;
                return Err(e);
            }
        };

        self.transport
            .notify(JsonRpcNotification::new("notifications/initialized", None))
            .await?;
        self.connected.store(true, Ordering::Release);

        let protocol = result
            .get("protocolVersion")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown");
        info!(
            server = %self.server,
            transport = %self.transport.kind(),
            protocol,
            "Connected to MCP server"
        );
        Ok(())
    }

    async fn disconnect(&self) -> McpResult<()> {
        self.connected.store(false, Ordering::Release);
        self.transport.close().await?;
        debug!(server = %self.server, "Disconnected");
        Ok(())
    }

    async fn list_tools(&self) -> McpResult<Vec<ToolInfo>> {
        self.ensure_connected()?;
        self.list_paginated("tools/list", "tools").await
    }

    async fn list_resources(&self) -> McpResult<Vec<ResourceInfo>> {
        self.ensure_connected()?;
        self.list_paginated("resources/list", "resources").await
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<Value> {
        self.ensure_connected()?;
        self.request("tools/call", Some(json!({ "name": name, "arguments": arguments })))
            .await
    }

    async fn read_resource(&self, uri: &str) -> McpResult<Value> {
        self.ensure_connected()?;
        self.request("resources/read", Some(json!({ "uri": uri }))).await
    }

    async fn ping(&self) -> McpResult<()> {
        self.ensure_connected()?;
        let _: Value = self.request_typed("ping", None).await?;
        Ok(())
    }
}
