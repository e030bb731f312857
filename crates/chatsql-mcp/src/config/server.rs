//! Server definitions and per-transport connection parameters

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use super::Defaults;
use crate::error::{McpError, McpResult};

static SERVER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("static server name pattern"));
static SSE_ENDPOINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?|wss?)://.+").expect("static SSE endpoint pattern"));
static HTTP_ENDPOINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://.+").expect("static HTTP endpoint pattern"));

/// Maximum length of a server name
pub const MAX_SERVER_NAME_LEN: usize = 50;

/// Highest per-server timeout accepted, in milliseconds
pub const MAX_TIMEOUT_MS: u64 = 300_000;

/// Default server priority when a definition omits it
pub const DEFAULT_PRIORITY: u8 = 50;

/// Transport used to reach an MCP server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Server-Sent Events (legacy MCP SSE transport)
    Sse,
    /// Subprocess speaking newline-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// Plain HTTP POST of JSON-RPC messages
    Http,
}

impl TransportKind {
    /// Lowercase tag as it appears in configuration files
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sse => "sse",
            Self::Stdio => "stdio",
            Self::Http => "http",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SSE transport parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SseConfig {
    /// SSE stream URL (`http`, `https`, `ws` or `wss`)
    pub endpoint: String,
    /// Extra request headers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// Request timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Stdio (subprocess) transport parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StdioConfig {
    /// Command to execute
    pub command: String,
    /// Command arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Extra environment variables for the child
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    /// Working directory for the child
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

/// HTTP transport parameters
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// JSON-RPC endpoint URL (`http` or `https`)
    pub endpoint: String,
    /// Bearer token sent as `Authorization`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Extra request headers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// Request timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("headers", &self.headers)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Transport-specific connection parameters
///
/// The variant doubles as the server's transport tag, so a definition can
/// never pair one transport with another transport's parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TransportConfig {
    /// SSE parameters
    Sse(SseConfig),
    /// Stdio parameters
    Stdio(StdioConfig),
    /// HTTP parameters
    Http(HttpConfig),
}

impl TransportConfig {
    /// Parse a raw `config` block against the schema of `kind`
    ///
    /// # Errors
    ///
    /// Returns `McpError::Configuration` naming `field` when the block does
    /// not match the transport's schema or fails value validation.
    pub fn parse(kind: TransportKind, value: Value, field: &str) -> McpResult<Self> {
        let parsed = match kind {
            TransportKind::Sse => serde_json::from_value(value).map(Self::Sse),
            TransportKind::Stdio => serde_json::from_value(value).map(Self::Stdio),
            TransportKind::Http => serde_json::from_value(value).map(Self::Http),
        }
        .map_err(|e| {
            McpError::configuration_field(field, format!("invalid {kind} transport config: {e}"))
        })?;

        parsed.validate(field)?;
        Ok(parsed)
    }

    /// Transport tag of these parameters
    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Sse(_) => TransportKind::Sse,
            Self::Stdio(_) => TransportKind::Stdio,
            Self::Http(_) => TransportKind::Http,
        }
    }

    /// Per-server timeout override, if any
    pub fn timeout_ms(&self) -> Option<u64> {
        match self {
            Self::Sse(c) => c.timeout,
            Self::Http(c) => c.timeout,
            Self::Stdio(_) => None,
        }
    }

    /// Validate field values
    ///
    /// # Errors
    ///
    /// Returns `McpError::Configuration` for a bad endpoint, empty command or
    /// out-of-range timeout.
    pub fn validate(&self, field: &str) -> McpResult<()> {
        match self {
            Self::Sse(c) => validate_endpoint(&c.endpoint, &SSE_ENDPOINT, "http, https, ws or wss", field)?,
            Self::Http(c) => validate_endpoint(&c.endpoint, &HTTP_ENDPOINT, "http or https", field)?,
            Self::Stdio(c) => {
                if c.command.trim().is_empty() {
                    return Err(McpError::configuration_field(
                        format!("{field}.command"),
                        "must not be empty",
                    ));
                }
            }
        }

        if let Some(timeout) = self.timeout_ms()
            && !(1..=MAX_TIMEOUT_MS).contains(&timeout)
        {
            return Err(McpError::configuration_field(
                format!("{field}.timeout"),
                format!("must be between 1 and {MAX_TIMEOUT_MS} ms, got {timeout}"),
            ));
        }

        Ok(())
    }
}

fn validate_endpoint(endpoint: &str, pattern: &Regex, schemes: &str, field: &str) -> McpResult<()> {
    let field = format!("{field}.endpoint");
    if !pattern.is_match(endpoint) {
        return Err(McpError::configuration_field(
            field,
            format!("'{endpoint}' must be a {schemes} URL"),
        ));
    }
    url::Url::parse(endpoint)
        .map_err(|e| McpError::configuration_field(field, format!("'{endpoint}' is not a valid URL: {e}")))?;
    Ok(())
}

/// One configured backend server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDefinition {
    /// Unique kebab-case name, also the tool namespace prefix
    pub name: String,
    /// Disabled servers are never connected
    pub enabled: bool,
    /// Free-form description
    pub description: Option<String>,
    /// 1-100, higher is preferred
    pub priority: u8,
    /// A critical server's failure aborts multi-server initialization
    pub critical: bool,
    /// Transport parameters (carries the transport tag)
    pub config: TransportConfig,
}

impl ServerDefinition {
    /// Create an enabled, non-critical definition with default priority
    pub fn new(name: impl Into<String>, config: TransportConfig) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            description: None,
            priority: DEFAULT_PRIORITY,
            critical: false,
            config,
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Mark the server critical (or not)
    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    /// Enable or disable the server
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Transport used to reach this server
    pub fn transport(&self) -> TransportKind {
        self.config.kind()
    }

    /// Effective request timeout: the server's own override or the global default
    pub fn timeout(&self, defaults: &Defaults) -> Duration {
        Duration::from_millis(self.config.timeout_ms().unwrap_or(defaults.timeout))
    }

    /// Validate name, priority and transport parameters
    ///
    /// `field` is the path prefix used in error messages (e.g. `servers[2]`).
    ///
    /// # Errors
    ///
    /// Returns `McpError::Configuration` identifying the first invalid field.
    pub fn validate(&self, field: &str) -> McpResult<()> {
        validate_server_name(&self.name, &format!("{field}.name"))?;
        validate_priority(i64::from(self.priority), &format!("{field}.priority"))?;
        self.config.validate(&format!("{field}.config"))
    }
}

impl Serialize for ServerDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Entry<'a> {
            name: &'a str,
            enabled: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<&'a str>,
            transport: TransportKind,
            priority: u8,
            critical: bool,
            config: &'a TransportConfig,
        }

        Entry {
            name: &self.name,
            enabled: self.enabled,
            description: self.description.as_deref(),
            transport: self.transport(),
            priority: self.priority,
            critical: self.critical,
            config: &self.config,
        }
        .serialize(serializer)
    }
}

/// Server entry as written in the configuration file
#[derive(Debug, Deserialize)]
pub(crate) struct ServerEntry {
    name: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    description: Option<String>,
    transport: TransportKind,
    #[serde(default = "default_priority")]
    priority: i64,
    #[serde(default)]
    critical: bool,
    config: Value,
}

fn default_enabled() -> bool {
    true
}

fn default_priority() -> i64 {
    i64::from(DEFAULT_PRIORITY)
}

impl ServerEntry {
    /// Validate the raw entry and resolve its transport block
    pub(crate) fn into_definition(self, field: &str) -> McpResult<ServerDefinition> {
        validate_server_name(&self.name, &format!("{field}.name"))?;
        let priority = validate_priority(self.priority, &format!("{field}.priority"))?;
        let config = TransportConfig::parse(self.transport, self.config, &format!("{field}.config"))?;

        Ok(ServerDefinition {
            name: self.name,
            enabled: self.enabled,
            description: self.description,
            priority,
            critical: self.critical,
            config,
        })
    }
}

fn validate_server_name(name: &str, field: &str) -> McpResult<()> {
    if name.is_empty() || name.len() > MAX_SERVER_NAME_LEN {
        return Err(McpError::configuration_field(
            field,
            format!("'{name}' must be 1-{MAX_SERVER_NAME_LEN} characters"),
        ));
    }
    if !SERVER_NAME.is_match(name) {
        return Err(McpError::configuration_field(
            field,
            format!("'{name}' must be kebab-case (lowercase letters, digits and hyphens)"),
        ));
    }
    Ok(())
}

fn validate_priority(priority: i64, field: &str) -> McpResult<u8> {
    match u8::try_from(priority) {
        Ok(p) if (1..=100).contains(&p) => Ok(p),
        _ => Err(McpError::configuration_field(
            field,
            format!("must be between 1 and 100, got {priority}"),
        )),
    }
}

/// Whether `name` is an acceptable server name
pub fn is_valid_server_name(name: &str) -> bool {
    validate_server_name(name, "name").is_ok()
}
