//! chatsql-mcp: multi-server MCP aggregation for the chat-to-SQL backend
//!
//! Connects the chat backend to one or more MCP servers (database access,
//! schema documentation, product metadata, ...) and presents them as a
//! single tool and resource catalog.
//!
//! # Features
//!
//! - **Declarative configuration**: servers, transports, priorities and
//!   criticality in one validated JSON document
//! - **Three transports**: legacy SSE, stdio subprocess and streamable HTTP
//! - **Namespacing**: tools are exposed as `server.tool` and routed back to
//!   their owner with the original name
//! - **Resource cache**: TTL cache in front of resource reads
//! - **Graceful degradation**: the adapter falls back to a single legacy
//!   server when multi-server startup fails
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use chatsql_mcp::prelude::*;
//! use serde_json::json;
//!
//! # async fn run() -> McpResult<()> {
//! let adapter = McpAdapter::new(AdapterSettings::from_env()?);
//! adapter.initialize().await?;
//!
//! let rows = adapter
//!     .execute_tool("sqlite-db.query", json!({"sql": "SELECT 1"}))
//!     .await?;
//! println!("{rows}");
//!
//! adapter.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ McpAdapter: mode selection, fallback, metrics        │
//! └──────────────────────────────────────────────────────┘
//!            ↓ multi-server               ↓ single-server
//! ┌────────────────────────────┐   ┌─────────────────────┐
//! │ Aggregator + ResourceCache │   │ legacy McpClient    │
//! │ ServerRegistry             │   └─────────────────────┘
//! └────────────────────────────┘
//!            ↓
//! ┌──────────────────────────────────────────────────────┐
//! │ ProtocolClient<T>: SseTransport │ StdioTransport │   │
//! │                    HttpTransport                     │
//! └──────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod aggregator;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod registry;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use adapter::{McpAdapter, RuntimeStats};
pub use aggregator::{Aggregator, NamespacedResource, NamespacedTool};
pub use cache::{CacheStats, ResourceCache};
pub use config::{AdapterMode, AdapterSettings, Configuration, ServerDefinition, TransportKind};
pub use error::{McpError, McpResult};
pub use health::{HealthStatus, ServerHealth};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::adapter::{McpAdapter, RuntimeStats};
    pub use crate::aggregator::{Aggregator, NamespacedResource, NamespacedTool, ReloadSummary};
    pub use crate::cache::{CacheStats, ResourceCache};
    pub use crate::client::{ClientFactory, McpClient, ResourceInfo, ToolInfo, TransportClientFactory};
    pub use crate::config::{
        AdapterMode, AdapterSettings, Configuration, Defaults, ServerDefinition, TransportConfig,
        TransportKind,
    };
    pub use crate::error::{McpError, McpResult};
    pub use crate::health::{HealthStatus, ServerHealth};
    pub use crate::registry::ServerRegistry;
}

/// Version of chatsql-mcp
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP protocol version sent in the `initialize` handshake
pub const MCP_PROTOCOL_VERSION: &str = client::jsonrpc::PROTOCOL_VERSION;
