//! Low-level transport trait
//!
//! A transport moves JSON-RPC frames. It knows nothing about MCP methods;
//! `ProtocolClient` layers the handshake and method set on top.

use async_trait::async_trait;

use super::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use crate::config::TransportKind;
use crate::error::McpResult;

/// A connection able to carry JSON-RPC requests to one MCP server
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport tag
    fn kind(&self) -> TransportKind;

    /// Open the underlying connection (spawn the process, open the stream)
    async fn connect(&self) -> McpResult<()>;

    /// Send a request and wait for the response with the same id
    async fn request(&self, request: JsonRpcRequest) -> McpResult<JsonRpcResponse>;

    /// Send a notification
    async fn notify(&self, notification: JsonRpcNotification) -> McpResult<()>;

    /// Close the connection; closing a closed transport is a no-op
    async fn close(&self) -> McpResult<()>;
}
