//! Error types for chatsql-mcp
//!
//! Errors fall into the classes the aggregation layer treats differently:
//! - Configuration: always fatal at load time
//! - Connection / Discovery: fatal for critical servers, tolerated otherwise
//! - Execution (tool calls, resource reads): always surfaced to the caller
//! - Initialization: the adapter-level wrapper raised when multi-server
//!   startup fails and fallback is disabled

use thiserror::Error;

/// Result type for aggregation-layer operations
pub type McpResult<T> = std::result::Result<T, McpError>;

/// Main error type for chatsql-mcp
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum McpError {
    /// Invalid configuration document or setting
    ///
    /// `field` names the offending field path (e.g. `servers[1].priority`).
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// Failed to establish a connection to a server
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        server: Option<String>,
    },

    /// A connected server failed to list its tools or resources
    #[error("Discovery error: {message}")]
    Discovery {
        message: String,
        server: Option<String>,
    },

    /// The server answered with a JSON-RPC error object
    #[error("Protocol error {code}: {message}")]
    Protocol { code: i64, message: String },

    /// The transport failed while a request was in flight
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        server: Option<String>,
    },

    /// Operation exceeded the server's configured timeout
    #[error("Timeout: {operation} exceeded {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// A namespaced tool name without a `server.` prefix
    #[error("Invalid tool name '{name}': expected '<server>.<tool>'")]
    InvalidToolName { name: String },

    /// The namespace prefix does not match any registered server
    #[error("Unknown server: {server}")]
    UnknownServer { server: String },

    /// No registered server exposes the requested resource URI
    #[error("Resource not found: {uri}")]
    ResourceNotFound { uri: String },

    /// A server name was registered twice
    #[error("Server '{name}' is already registered")]
    DuplicateServer { name: String },

    /// The client has not been connected yet (or was disconnected)
    #[error("Server '{server}' is not connected")]
    NotConnected { server: String },

    /// The adapter was used before `initialize` (or after `shutdown`)
    #[error("Adapter is not initialized")]
    NotInitialized,

    /// Multi-server initialization failed and fallback is disabled
    #[error("Adapter initialization failed: {message}")]
    Initialization {
        message: String,
        #[source]
        source: Box<McpError>,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl McpError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: None,
        }
    }

    /// Create a configuration error that names the offending field
    ///
    /// The field path is prefixed to the message so the rendered error
    /// identifies it on its own.
    pub fn configuration_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        Self::Configuration {
            message: format!("{field}: {}", message.into()),
            field: Some(field),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            server: None,
        }
    }

    /// Create a connection error attributed to a server
    pub fn connection_to(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            server: Some(server.into()),
        }
    }

    /// Create a discovery error attributed to a server
    pub fn discovery(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Discovery {
            message: message.into(),
            server: Some(server.into()),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            server: None,
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Wrap a multi-server startup failure as an adapter-level error
    pub fn initialization(message: impl Into<String>, source: McpError) -> Self {
        Self::Initialization {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Errors caused by a bad argument rather than a failing server
    ///
    /// Malformed tool names, unknown server prefixes and unknown resource
    /// URIs are rejected without contacting any server.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidToolName { .. } | Self::UnknownServer { .. } | Self::ResourceNotFound { .. }
        )
    }

    /// Check if this error is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Transport { .. } | Self::Timeout { .. } | Self::Io(_)
        )
    }

    /// Sanitize error message for client responses
    ///
    /// Removes internal details (paths, endpoints, server output).
    pub fn sanitize(&self) -> String {
        match self {
            Self::Configuration { .. } => "Configuration error".to_string(),
            Self::Connection { .. } => "Server connection failed".to_string(),
            Self::Discovery { .. } => "Server discovery failed".to_string(),
            Self::Protocol { code, .. } => format!("Server returned error {code}"),
            Self::Transport { .. } => "Transport error occurred".to_string(),
            Self::Timeout { operation, .. } => format!("Operation '{operation}' timed out"),
            Self::InvalidToolName { .. } | Self::UnknownServer { .. } => {
                "Unknown tool".to_string()
            }
            Self::ResourceNotFound { .. } => "Unknown resource".to_string(),
            Self::DuplicateServer { .. } => "Duplicate server registration".to_string(),
            Self::NotConnected { .. } => "Server not connected".to_string(),
            Self::NotInitialized | Self::Initialization { .. } => {
                "Adapter initialization failed".to_string()
            }
            Self::Serialization(_) => "Data serialization error".to_string(),
            Self::Io(_) => "IO error occurred".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_field_names_the_field() {
        let err = McpError::configuration_field("servers[1].priority", "must be between 1 and 100");
        match &err {
            McpError::Configuration { message, field } => {
                assert_eq!(field.as_deref(), Some("servers[1].priority"));
                assert!(message.starts_with("servers[1].priority:"));
            }
            _ => panic!("Wrong error type"),
        }
        assert!(err.to_string().contains("servers[1].priority"));
    }

    #[test]
    fn test_invalid_input_classification() {
        assert!(McpError::InvalidToolName { name: "x".into() }.is_invalid_input());
        assert!(McpError::UnknownServer { server: "db".into() }.is_invalid_input());
        assert!(McpError::ResourceNotFound { uri: "db://x".into() }.is_invalid_input());
        assert!(!McpError::timeout("tools/call", 10).is_invalid_input());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(McpError::timeout("tools/call", 30000).is_retryable());
        assert!(McpError::connection("refused").is_retryable());
        assert!(!McpError::configuration("bad config").is_retryable());
    }

    #[test]
    fn test_initialization_wraps_source() {
        use std::error::Error as _;

        let err = McpError::initialization(
            "multi-server startup failed",
            McpError::connection_to("db", "refused"),
        );
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("Connection error: refused"));
    }

    #[test]
    fn test_error_sanitization() {
        let err = McpError::connection_to("db", "connect to 10.0.0.5:8000 refused");
        assert_eq!(err.sanitize(), "Server connection failed");
    }
}
