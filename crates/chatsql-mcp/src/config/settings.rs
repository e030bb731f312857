//! Adapter settings
//!
//! An explicit settings value handed to `McpAdapter::new`; whoever assembles
//! the adapter owns it. `from_env` covers the usual deployment variables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::{ServerDefinition, SseConfig, TransportConfig};
use crate::error::{McpError, McpResult};

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "mcp_servers.json";

/// Default resource cache TTL
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Name given to the legacy single server
pub const LEGACY_SERVER_NAME: &str = "default";

/// Adapter operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdapterMode {
    /// One legacy server, tool names carry no prefix
    SingleServer,
    /// Every configured server aggregated, tool names are `server.tool`
    MultiServer,
    /// Multi-server when a usable configuration file exists
    #[default]
    Auto,
}

impl AdapterMode {
    /// Upper-case name as used by `MCP_MODE`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleServer => "SINGLE_SERVER",
            Self::MultiServer => "MULTI_SERVER",
            Self::Auto => "AUTO",
        }
    }
}

impl fmt::Display for AdapterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdapterMode {
    type Err = McpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "SINGLE_SERVER" | "SINGLE" => Ok(Self::SingleServer),
            "MULTI_SERVER" | "MULTI" => Ok(Self::MultiServer),
            "AUTO" => Ok(Self::Auto),
            _ => Err(McpError::configuration_field(
                "MCP_MODE",
                format!("unknown mode '{s}' (expected SINGLE_SERVER, MULTI_SERVER or AUTO)"),
            )),
        }
    }
}

/// Settings for one adapter instance
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterSettings {
    /// Requested operating mode
    pub mode: AdapterMode,
    /// Multi-server configuration file
    pub config_path: PathBuf,
    /// Fall back to single-server mode when multi-server startup fails
    pub fallback_enabled: bool,
    /// The legacy server used in single-server mode
    pub legacy_server: Option<ServerDefinition>,
    /// Resource cache TTL; `None` disables resource caching
    pub cache_ttl: Option<Duration>,
    /// Client name sent during the MCP handshake
    pub client_name: String,
    /// Client version sent during the MCP handshake
    pub client_version: String,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            mode: AdapterMode::Auto,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            fallback_enabled: true,
            legacy_server: None,
            cache_ttl: Some(DEFAULT_CACHE_TTL),
            client_name: "chatsql-mcp".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl AdapterSettings {
    /// Settings with an explicit mode and configuration path
    pub fn new(mode: AdapterMode, config_path: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            config_path: config_path.into(),
            ..Self::default()
        }
    }

    /// Enable or disable single-server fallback
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    /// Use an SSE endpoint as the legacy single server
    pub fn with_legacy_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.legacy_server = Some(legacy_definition(endpoint.into()));
        self
    }

    /// Use an arbitrary definition as the legacy single server
    pub fn with_legacy_server(mut self, definition: ServerDefinition) -> Self {
        self.legacy_server = Some(definition);
        self
    }

    /// Set (or disable) the resource cache TTL
    pub fn with_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Read settings from the process environment
    ///
    /// # Errors
    ///
    /// Returns `McpError::Configuration` when a variable holds an invalid value.
    pub fn from_env() -> McpResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through a lookup function
    ///
    /// Recognised keys: `MCP_MODE`, `MCP_CONFIG_PATH` (or `MCP_SERVERS_CONFIG`),
    /// `MCP_FALLBACK_ENABLED`, `MCP_SERVER_URL`, `MCP_CACHE_TTL` (seconds, `0`
    /// disables caching).
    ///
    /// # Errors
    ///
    /// Returns `McpError::Configuration` when a variable holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> McpResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(mode) = lookup("MCP_MODE") {
            settings.mode = mode.parse()?;
        }

        if let Some(path) = lookup("MCP_CONFIG_PATH").or_else(|| lookup("MCP_SERVERS_CONFIG")) {
            settings.config_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup("MCP_FALLBACK_ENABLED") {
            settings.fallback_enabled = parse_bool("MCP_FALLBACK_ENABLED", &raw)?;
        }

        if let Some(url) = lookup("MCP_SERVER_URL") {
            let definition = legacy_definition(url);
            definition.validate("MCP_SERVER_URL")?;
            settings.legacy_server = Some(definition);
        }

        if let Some(raw) = lookup("MCP_CACHE_TTL") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                McpError::configuration_field("MCP_CACHE_TTL", format!("'{raw}' is not a number of seconds"))
            })?;
            settings.cache_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(settings)
    }
}

fn legacy_definition(endpoint: String) -> ServerDefinition {
    ServerDefinition::new(
        LEGACY_SERVER_NAME,
        TransportConfig::Sse(SseConfig {
            endpoint,
            headers: HashMap::new(),
            timeout: None,
        }),
    )
}

fn parse_bool(key: &str, raw: &str) -> McpResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(McpError::configuration_field(key, format!("'{raw}' is not a boolean"))),
    }
}
