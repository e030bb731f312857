//! Transport client factory

use std::sync::Arc;
use tracing::debug;

use super::http::HttpTransport;
use super::protocol::{ClientInfo, ProtocolClient};
use super::sse::SseTransport;
use super::stdio::StdioTransport;
use super::McpClient;
use crate::config::{Defaults, ServerDefinition, TransportConfig};
use crate::error::McpResult;

/// Builds unconnected clients from server definitions
pub trait ClientFactory: Send + Sync {
    /// Create a client for `definition`; the caller connects it
    ///
    /// # Errors
    ///
    /// Returns an error when the transport cannot be constructed.
    fn create(&self, definition: &ServerDefinition, defaults: &Defaults) -> McpResult<Arc<dyn McpClient>>;
}

/// Factory producing one `ProtocolClient` per transport tag
#[derive(Debug, Clone, Default)]
pub struct TransportClientFactory {
    client_info: ClientInfo,
}

impl TransportClientFactory {
    /// Factory announcing `client_info` in every handshake
    pub fn new(client_info: ClientInfo) -> Self {
        Self { client_info }
    }
}

impl ClientFactory for TransportClientFactory {
    fn create(&self, definition: &ServerDefinition, defaults: &Defaults) -> McpResult<Arc<dyn McpClient>> {
        let timeout = definition.timeout(defaults);
        let name = definition.name.as_str();
        let info = self.client_info.clone();
        debug!(server = %name, transport = %definition.transport(), ?timeout, "Creating client");

        let client: Arc<dyn McpClient> = match &definition.config {
            TransportConfig::Sse(config) => Arc::new(ProtocolClient::new(
                name,
                SseTransport::new(name, config)?,
                timeout,
                info,
            )),
            TransportConfig::Stdio(config) => Arc::new(ProtocolClient::new(
                name,
                StdioTransport::new(name, config.clone()),
                timeout,
                info,
            )),
            TransportConfig::Http(config) => Arc::new(ProtocolClient::new(
                name,
                HttpTransport::new(name, config)?,
                timeout,
                info,
            )),
        };
        Ok(client)
    }
}
