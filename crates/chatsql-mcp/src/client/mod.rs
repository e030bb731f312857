//! MCP clients
//!
//! Every configured server is reached through an [`McpClient`], whatever its
//! transport. [`ProtocolClient`] implements the client once over any
//! [`Transport`]; [`TransportClientFactory`] picks the transport from a
//! server definition.

pub mod factory;
pub mod http;
pub mod jsonrpc;
pub mod protocol;
pub mod sse;
pub mod stdio;
pub mod transport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::TransportKind;
use crate::error::McpResult;

pub use factory::{ClientFactory, TransportClientFactory};
pub use http::HttpTransport;
pub use protocol::{ClientInfo, ProtocolClient};
pub use sse::SseTransport;
pub use stdio::StdioTransport;
pub use transport::Transport;

/// A tool as listed by a server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    /// Tool name, unique within its server
    pub name: String,
    /// Human description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema of the tool arguments
    #[serde(default)]
    pub input_schema: Value,
}

impl ToolInfo {
    /// Tool with an empty object schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: serde_json::json!({"type": "object"}),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A resource as listed by a server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    /// Resource URI
    pub uri: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Human description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl ResourceInfo {
    /// Resource with only a URI
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: None,
            description: None,
            mime_type: None,
        }
    }
}

/// Uniform async surface over one MCP server
///
/// Implementations enforce their own request timeout and surface it as
/// `McpError::Timeout`.
#[async_trait]
pub trait McpClient: Send + Sync {
    /// Configured server name
    fn server_name(&self) -> &str;

    /// Transport used to reach the server
    fn transport(&self) -> TransportKind;

    /// Whether `connect` has succeeded and `disconnect` has not been called
    fn is_connected(&self) -> bool;

    /// Connect and complete the MCP handshake
    async fn connect(&self) -> McpResult<()>;

    /// Close the connection
    async fn disconnect(&self) -> McpResult<()>;

    /// List the server's tools
    async fn list_tools(&self) -> McpResult<Vec<ToolInfo>>;

    /// List the server's resources
    async fn list_resources(&self) -> McpResult<Vec<ResourceInfo>>;

    /// Invoke a tool by its unprefixed name
    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<Value>;

    /// Read a resource
    async fn read_resource(&self, uri: &str) -> McpResult<Value>;

    /// Liveness probe
    async fn ping(&self) -> McpResult<()>;
}
