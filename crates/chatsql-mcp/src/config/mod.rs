//! Server configuration model
//!
//! Parses and eagerly validates the declarative multi-server configuration
//! document. Loading never opens a connection, and a configuration is only
//! ever returned fully validated.
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "defaults": {"timeout": 30000, "retry_attempts": 3, "retry_delay": 1000},
//!   "servers": [
//!     {"name": "sqlite-db", "transport": "sse", "priority": 100, "critical": true,
//!      "config": {"endpoint": "http://localhost:8000/sse"}}
//!   ]
//! }
//! ```

pub mod server;
pub mod settings;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

use crate::error::{McpError, McpResult};
use server::ServerEntry;

pub use server::{
    HttpConfig, ServerDefinition, SseConfig, StdioConfig, TransportConfig, TransportKind,
    is_valid_server_name,
};
pub use settings::{AdapterMode, AdapterSettings};

static SEMVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("static version pattern"));

/// Maximum accepted `defaults.retry_attempts`
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Global connection defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Request timeout in milliseconds
    pub timeout: u64,
    /// Additional connection attempts after the first failure (0-10)
    pub retry_attempts: u32,
    /// Delay between connection attempts in milliseconds
    pub retry_delay: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: 30_000,
            retry_attempts: 3,
            retry_delay: 1_000,
        }
    }
}

impl Defaults {
    /// Delay between connection attempts
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay)
    }

    fn validate(&self) -> McpResult<()> {
        if self.timeout == 0 {
            return Err(McpError::configuration_field(
                "defaults.timeout",
                "must be a positive number of milliseconds",
            ));
        }
        if self.retry_attempts > MAX_RETRY_ATTEMPTS {
            return Err(McpError::configuration_field(
                "defaults.retry_attempts",
                format!("must be between 0 and {MAX_RETRY_ATTEMPTS}, got {}", self.retry_attempts),
            ));
        }
        if self.retry_delay == 0 {
            return Err(McpError::configuration_field(
                "defaults.retry_delay",
                "must be a positive number of milliseconds",
            ));
        }
        Ok(())
    }
}

/// Free-form description block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Human description of this deployment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation timestamp (ISO-8601, not interpreted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Any other keys, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Root configuration document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
    /// Semantic version `X.Y.Z`
    pub version: String,
    /// Optional description block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ConfigMetadata>,
    /// Global defaults
    pub defaults: Defaults,
    /// Configured servers (non-empty, unique names)
    pub servers: Vec<ServerDefinition>,
}

#[derive(Deserialize)]
struct RawConfiguration {
    version: String,
    #[serde(default)]
    metadata: Option<ConfigMetadata>,
    #[serde(default)]
    defaults: Defaults,
    servers: Vec<ServerEntry>,
}

impl Configuration {
    /// Read and validate a configuration file
    ///
    /// # Errors
    ///
    /// Returns `McpError::Io` if the file cannot be read and
    /// `McpError::Configuration` if it is malformed or invalid.
    pub fn load(path: impl AsRef<Path>) -> McpResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading server configuration");
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse and validate a configuration document
    ///
    /// # Errors
    ///
    /// Returns `McpError::Configuration` identifying the offending field.
    pub fn from_json(contents: &str) -> McpResult<Self> {
        let raw: RawConfiguration = serde_json::from_str(contents)
            .map_err(|e| McpError::configuration(format!("malformed configuration JSON: {e}")))?;

        let servers = raw
            .servers
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| entry.into_definition(&format!("servers[{idx}]")))
            .collect::<McpResult<Vec<_>>>()?;

        let config = Self {
            version: raw.version,
            metadata: raw.metadata,
            defaults: raw.defaults,
            servers,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the whole document
    ///
    /// # Errors
    ///
    /// Returns `McpError::Configuration` for a bad version, bad defaults, an
    /// empty server list, an invalid server or a duplicated server name.
    pub fn validate(&self) -> McpResult<()> {
        if !SEMVER.is_match(&self.version) {
            return Err(McpError::configuration_field(
                "version",
                format!("'{}' is not a semantic version (X.Y.Z)", self.version),
            ));
        }

        self.defaults.validate()?;

        if self.servers.is_empty() {
            return Err(McpError::configuration_field(
                "servers",
                "at least one server must be configured",
            ));
        }

        let mut seen = HashSet::with_capacity(self.servers.len());
        for (idx, server) in self.servers.iter().enumerate() {
            server.validate(&format!("servers[{idx}]"))?;
            if !seen.insert(server.name.as_str()) {
                return Err(McpError::configuration_field(
                    format!("servers[{idx}].name"),
                    format!("duplicate server name '{}'", server.name),
                ));
            }
        }

        Ok(())
    }

    /// Enabled servers, highest priority first
    ///
    /// Ties keep their order in the document.
    pub fn enabled_servers_by_priority(&self) -> Vec<&ServerDefinition> {
        let mut servers: Vec<_> = self.servers.iter().filter(|s| s.enabled).collect();
        servers.sort_by(|a, b| b.priority.cmp(&a.priority));
        servers
    }

    /// Look up a server definition by name
    pub fn server(&self, name: &str) -> Option<&ServerDefinition> {
        self.servers.iter().find(|s| s.name == name)
    }
}
