//! Multi-server aggregator
//!
//! Presents every registered server's tools and resources as one catalog
//! and routes invocations back to the owning client. Tools are exposed as
//! `"{server}.{tool}"`; resource URIs are exposed unchanged and resolved
//! by searching servers in priority order.
//!
//! The catalog is built by [`Aggregator::initialize`] and only refreshed
//! by another `initialize` or by [`Aggregator::reload_configuration`].

use futures::future::join_all;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheStats, ResourceCache};
use crate::client::{ClientFactory, McpClient, ResourceInfo, ToolInfo};
use crate::config::{AdapterMode, Configuration, Defaults, ServerDefinition};
use crate::error::{McpError, McpResult};
use crate::health::{HealthStatus, ServerHealth};
use crate::registry::{RegisteredServer, ServerRegistry};

/// Separator between server name and tool name
pub const NAMESPACE_SEPARATOR: char = '.';

/// A tool exposed under its server's namespace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespacedTool {
    /// `"{server}.{original_name}"`
    pub name: String,
    /// Owning server
    pub server: String,
    /// Name on the owning server
    pub original_name: String,
    /// Tool description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Argument schema
    pub input_schema: Value,
}

impl NamespacedTool {
    fn new(server: &str, tool: ToolInfo) -> Self {
        Self {
            name: namespaced_name(server, &tool.name),
            server: server.to_string(),
            original_name: tool.name,
            description: tool.description,
            input_schema: tool.input_schema,
        }
    }
}

/// A resource together with the server that exposes it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespacedResource {
    /// Resource URI, unchanged
    pub uri: String,
    /// Owning server
    pub server: String,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl NamespacedResource {
    fn new(server: &str, resource: ResourceInfo) -> Self {
        Self {
            uri: resource.uri,
            server: server.to_string(),
            name: resource.name,
            description: resource.description,
            mime_type: resource.mime_type,
        }
    }
}

/// Where a resource read was answered from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSource {
    /// The resource cache
    Cache,
    /// The named server
    Server(String),
}

/// Catalog and server counts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatorStats {
    /// Registered servers
    pub active_servers: usize,
    /// Tools in the catalog
    pub total_tools: usize,
    /// Resources in the catalog
    pub total_resources: usize,
    /// Registered server names, highest priority first
    pub servers: Vec<String>,
    /// Resource cache statistics, when caching is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
}

/// Outcome of a configuration reload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReloadSummary {
    /// Newly connected servers
    pub added: Vec<String>,
    /// Disconnected and unregistered servers
    pub removed: Vec<String>,
    /// Servers reconnected because their definition changed
    pub reconnected: Vec<String>,
    /// Servers left untouched
    pub unchanged: Vec<String>,
    /// Servers that failed to connect and were skipped
    pub failed: Vec<String>,
}

#[derive(Debug, Default)]
struct Catalog {
    tools: Vec<NamespacedTool>,
    resources: Vec<NamespacedResource>,
}

/// Build a namespaced tool name
pub fn namespaced_name(server: &str, tool: &str) -> String {
    format!("{server}{NAMESPACE_SEPARATOR}{tool}")
}

/// Split a namespaced tool name at the first separator
///
/// # Errors
///
/// Returns `McpError::InvalidToolName` when `name` has no separator or an
/// empty half.
pub fn split_namespaced(name: &str) -> McpResult<(&str, &str)> {
    match name.split_once(NAMESPACE_SEPARATOR) {
        Some((server, tool)) if !server.is_empty() && !tool.is_empty() => Ok((server, tool)),
        _ => Err(McpError::InvalidToolName {
            name: name.to_string(),
        }),
    }
}

/// Create and connect one client, retrying retryable failures
///
/// Makes up to `defaults.retry_attempts + 1` attempts separated by
/// `defaults.retry_delay`.
///
/// # Errors
///
/// Returns the last connection error.
pub async fn connect_with_retry(
    factory: &dyn ClientFactory,
    definition: &ServerDefinition,
    defaults: &Defaults,
) -> McpResult<Arc<dyn McpClient>> {
    let client = factory.create(definition, defaults)?;
    let attempts = defaults.retry_attempts.saturating_add(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match client.connect().await {
            Ok(()) => return Ok(client),
            Err(e) if attempt < attempts && e.is_retryable() => {
                warn!(
                    server = %definition.name,
                    attempt,
                    "Connection failed, retrying in {:?}: {e}",
                    defaults.retry_delay()
                );
                tokio::time::sleep(defaults.retry_delay()).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Multi-server aggregator
pub struct Aggregator {
    config: RwLock<Configuration>,
    config_path: Option<PathBuf>,
    factory: Arc<dyn ClientFactory>,
    registry: RwLock<ServerRegistry>,
    catalog: RwLock<Catalog>,
    cache: Option<Arc<ResourceCache>>,
    reload_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("config_path", &self.config_path)
            .field("servers", &self.registry.read().names())
            .field("cache", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl Aggregator {
    /// Aggregator over an already populated registry
    pub fn new(
        config: Configuration,
        registry: ServerRegistry,
        factory: Arc<dyn ClientFactory>,
        cache: Option<Arc<ResourceCache>>,
    ) -> Self {
        Self {
            config: RwLock::new(config),
            config_path: None,
            factory,
            registry: RwLock::new(registry),
            catalog: RwLock::new(Catalog::default()),
            cache,
            reload_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Connect every enabled server in priority order and register it
    ///
    /// A non-critical server that cannot be reached is logged and left out.
    ///
    /// # Errors
    ///
    /// Returns the connection error of the first critical server that cannot
    /// be reached; servers connected so far are disconnected first.
    pub async fn connect(
        config: Configuration,
        factory: Arc<dyn ClientFactory>,
        cache: Option<Arc<ResourceCache>>,
    ) -> McpResult<Self> {
        let mut registry = ServerRegistry::new();

        for definition in config.enabled_servers_by_priority() {
            match connect_with_retry(factory.as_ref(), definition, &config.defaults).await {
                Ok(client) => {
                    info!(
                        server = %definition.name,
                        transport = %definition.transport(),
                        priority = definition.priority,
                        "Server connected"
                    );
                    registry.register(definition.name.clone(), client, definition.clone())?;
                }
                Err(e) if definition.critical => {
                    error!(server = %definition.name, "Critical server unreachable: {e}");
                    disconnect_all(registry.all().into_iter().cloned().collect()).await;
                    return Err(e);
                }
                Err(e) => {
                    warn!(server = %definition.name, "Skipping unreachable server: {e}");
                }
            }
        }

        if registry.is_empty() {
            warn!("No configured server could be connected");
        }

        Ok(Self::new(config, registry, factory, cache))
    }

    /// Remember the file the configuration came from, for reloads
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Current configuration
    pub fn configuration(&self) -> Configuration {
        self.config.read().clone()
    }

    /// Resource cache, if enabled
    pub fn cache(&self) -> Option<&Arc<ResourceCache>> {
        self.cache.as_ref()
    }

    fn servers_by_priority(&self) -> Vec<RegisteredServer> {
        self.registry.read().by_priority().into_iter().cloned().collect()
    }

    /// Discover every registered server's tools and resources
    ///
    /// A failing non-critical server is logged and contributes nothing.
    ///
    /// # Errors
    ///
    /// Returns `McpError::Discovery` when a critical server fails discovery;
    /// the previous catalog is kept in that case.
    pub async fn initialize(&self) -> McpResult<()> {
        let mut catalog = Catalog::default();

        for server in self.servers_by_priority() {
            match discover(server.client.as_ref()).await {
                Ok((tools, resources)) => {
                    debug!(
                        server = %server.name,
                        tools = tools.len(),
                        resources = resources.len(),
                        "Discovered server catalog"
                    );
                    catalog
                        .tools
                        .extend(tools.into_iter().map(|t| NamespacedTool::new(&server.name, t)));
                    catalog
                        .resources
                        .extend(resources.into_iter().map(|r| NamespacedResource::new(&server.name, r)));
                }
                Err(e) if server.definition.critical => {
                    error!(server = %server.name, "Discovery failed on critical server: {e}");
                    return Err(match e {
                        McpError::Discovery { .. } => e,
                        other => McpError::discovery(&server.name, other.to_string()),
                    });
                }
                Err(e) => {
                    warn!(server = %server.name, "Discovery failed, omitting server: {e}");
                }
            }
        }

        info!(
            tools = catalog.tools.len(),
            resources = catalog.resources.len(),
            "Aggregated catalog built"
        );
        *self.catalog.write() = catalog;
        Ok(())
    }

    /// Namespaced tools from the last discovery
    pub fn list_tools(&self) -> Vec<NamespacedTool> {
        self.catalog.read().tools.clone()
    }

    /// Resources from the last discovery, in server priority order
    pub fn list_resources(&self) -> Vec<NamespacedResource> {
        self.catalog.read().resources.clone()
    }

    /// Resolve a namespaced tool name to its client and original name
    ///
    /// # Errors
    ///
    /// Returns `McpError::InvalidToolName` for a name without a server prefix
    /// and `McpError::UnknownServer` when the prefix is not registered.
    pub fn resolve_tool<'a>(&self, name: &'a str) -> McpResult<(Arc<dyn McpClient>, &'a str)> {
        let (server, tool) = split_namespaced(name)?;
        let client = self
            .registry
            .read()
            .get(server)
            .map(|s| Arc::clone(&s.client))
            .ok_or_else(|| McpError::UnknownServer {
                server: server.to_string(),
            })?;
        Ok((client, tool))
    }

    /// Invoke a namespaced tool on its owning server
    ///
    /// # Errors
    ///
    /// Returns name resolution errors without contacting any server, and
    /// otherwise whatever the owning client returns.
    pub async fn execute_tool(&self, name: &str, arguments: Value) -> McpResult<Value> {
        let (client, tool) = self.resolve_tool(name)?;
        debug!(server = %client.server_name(), tool, "Routing tool call");
        client.call_tool(tool, arguments).await
    }

    /// Read a resource from the highest-priority server exposing it
    ///
    /// # Errors
    ///
    /// Returns `McpError::ResourceNotFound` when no server lists `uri`.
    pub async fn get_resource(&self, uri: &str) -> McpResult<Value> {
        self.get_resource_with_source(uri).await.map(|(value, _)| value)
    }

    /// Read a resource and report whether the cache answered
    ///
    /// # Errors
    ///
    /// Returns `McpError::ResourceNotFound` when no server lists `uri`, and
    /// otherwise whatever the owning client returns.
    pub async fn get_resource_with_source(&self, uri: &str) -> McpResult<(Value, ResourceSource)> {
        if let Some(value) = self.cache.as_ref().and_then(|c| c.get(uri)) {
            debug!(uri, "Resource served from cache");
            return Ok((value, ResourceSource::Cache));
        }

        let (server, client) = self.resource_owner(uri)?;
        debug!(server = %server, uri, "Routing resource read");
        let value = client.read_resource(uri).await?;

        if let Some(cache) = &self.cache {
            cache.set(uri, value.clone());
        }
        Ok((value, ResourceSource::Server(server)))
    }

    fn resource_owner(&self, uri: &str) -> McpResult<(String, Arc<dyn McpClient>)> {
        let catalog = self.catalog.read();
        let registry = self.registry.read();
        catalog
            .resources
            .iter()
            .filter(|r| r.uri == uri)
            .find_map(|r| {
                registry
                    .get(&r.server)
                    .map(|s| (s.name.clone(), Arc::clone(&s.client)))
            })
            .ok_or_else(|| McpError::ResourceNotFound { uri: uri.to_string() })
    }

    /// Server, tool and resource counts
    pub fn get_stats(&self) -> AggregatorStats {
        let catalog = self.catalog.read();
        let servers: Vec<String> = self
            .registry
            .read()
            .by_priority()
            .iter()
            .map(|s| s.name.clone())
            .collect();
        AggregatorStats {
            active_servers: servers.len(),
            total_tools: catalog.tools.len(),
            total_resources: catalog.resources.len(),
            servers,
            cache: self.cache.as_ref().map(|c| c.get_stats()),
        }
    }

    /// Probe every registered server concurrently
    pub async fn health_check(&self) -> HealthStatus {
        let servers = self.servers_by_priority();
        if servers.is_empty() {
            return HealthStatus::unhealthy(AdapterMode::MultiServer, "no servers connected");
        }

        let probes = servers.into_iter().map(|server| async move {
            let started = Instant::now();
            let result = server.client.ping().await;
            let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            let health = ServerHealth {
                healthy: result.is_ok(),
                transport: server.definition.transport(),
                priority: server.definition.priority,
                critical: server.definition.critical,
                error: result.err().map(|e| e.to_string()),
                latency_ms: Some(latency_ms),
            };
            (server.name, health)
        });

        let results: BTreeMap<_, _> = join_all(probes).await.into_iter().collect();
        let status = HealthStatus::from_servers(AdapterMode::MultiServer, results);
        if !status.healthy {
            warn!(unhealthy = ?status.unhealthy_servers(), "Health check found unhealthy servers");
        }
        status
    }

    /// Disconnect every registered client and clear the catalog
    ///
    /// Best effort: a failing disconnect is logged and the rest still run.
    pub async fn shutdown(&self) {
        let servers: Vec<RegisteredServer> = {
            let mut registry = self.registry.write();
            registry
                .names()
                .iter()
                .filter_map(|name| registry.remove(name))
                .collect()
        };
        *self.catalog.write() = Catalog::default();
        disconnect_all(servers).await;
        info!("Aggregator shut down");
    }

    /// Re-read the configuration file and reconcile registered servers
    ///
    /// New servers are connected, removed or disabled ones disconnected,
    /// changed ones reconnected and unchanged ones left alone. Discovery is
    /// then run again.
    ///
    /// # Errors
    ///
    /// Returns configuration errors (leaving everything untouched), the
    /// connection error of a critical server, or a discovery error. The
    /// catalog never lists a server that is no longer registered, even
    /// when the reload fails part way.
    pub async fn reload_configuration(&self) -> McpResult<ReloadSummary> {
        let path = self
            .config_path
            .clone()
            .ok_or_else(|| McpError::configuration("no configuration path to reload from"))?;
        let config = Configuration::load(&path)?;
        self.apply_configuration(config).await
    }

    /// Reconcile registered servers against `config`
    ///
    /// # Errors
    ///
    /// See [`Aggregator::reload_configuration`].
    pub async fn apply_configuration(&self, config: Configuration) -> McpResult<ReloadSummary> {
        let _reload = self.reload_lock.lock().await;
        let mut summary = ReloadSummary::default();
        let mut failure = None;

        let wanted: Vec<ServerDefinition> = config
            .enabled_servers_by_priority()
            .into_iter()
            .cloned()
            .collect();
        let wanted_names: HashSet<&str> = wanted.iter().map(|d| d.name.as_str()).collect();

        let stale: Vec<RegisteredServer> = {
            let mut registry = self.registry.write();
            registry
                .names()
                .into_iter()
                .filter(|name| !wanted_names.contains(name.as_str()))
                .filter_map(|name| registry.remove(&name))
                .collect()
        };
        summary.removed = stale.iter().map(|s| s.name.clone()).collect();
        disconnect_all(stale).await;

        for definition in &wanted {
            let existing = self.registry.read().get(&definition.name).cloned();
            let changed = match existing {
                Some(current) if current.definition == *definition => {
                    summary.unchanged.push(definition.name.clone());
                    continue;
                }
                Some(current) => {
                    self.registry.write().remove(&current.name);
                    if let Err(e) = current.client.disconnect().await {
                        warn!(server = %current.name, "Disconnect failed: {e}");
                    }
                    true
                }
                None => false,
            };

            match connect_with_retry(self.factory.as_ref(), definition, &config.defaults).await {
                Ok(client) => {
                    self.registry
                        .write()
                        .register(definition.name.clone(), client, definition.clone())?;
                    if changed {
                        summary.reconnected.push(definition.name.clone());
                    } else {
                        summary.added.push(definition.name.clone());
                    }
                }
                Err(e) if definition.critical => {
                    error!(server = %definition.name, "Critical server unreachable on reload: {e}");
                    failure = Some(e);
                    break;
                }
                Err(e) => {
                    warn!(server = %definition.name, "Skipping unreachable server on reload: {e}");
                    summary.failed.push(definition.name.clone());
                }
            }
        }

        {
            let document_order: Vec<&str> = config.servers.iter().map(|d| d.name.as_str()).collect();
            self.registry.write().arrange(&document_order);
        }
        *self.config.write() = config;

        let discovered = self.initialize().await;
        if discovered.is_err() {
            self.retain_registered();
        }
        if let Some(e) = failure {
            return Err(e);
        }
        discovered?;

        info!(
            added = summary.added.len(),
            removed = summary.removed.len(),
            reconnected = summary.reconnected.len(),
            unchanged = summary.unchanged.len(),
            "Configuration reloaded"
        );
        Ok(summary)
    }

    /// Drop catalog entries whose server is no longer registered
    fn retain_registered(&self) {
        let registered: HashSet<String> = self.registry.read().names().into_iter().collect();
        let mut catalog = self.catalog.write();
        catalog.tools.retain(|t| registered.contains(&t.server));
        catalog.resources.retain(|r| registered.contains(&r.server));
    }

    /// Clear the resource cache; returns whether one exists
    pub fn clear_cache(&self) -> bool {
        match &self.cache {
            Some(cache) => {
                cache.clear();
                debug!("Resource cache cleared");
                true
            }
            None => false,
        }
    }
}

async fn discover(client: &dyn McpClient) -> McpResult<(Vec<ToolInfo>, Vec<ResourceInfo>)> {
    let tools = client.list_tools().await?;
    let resources = client.list_resources().await?;
    Ok((tools, resources))
}

async fn disconnect_all(servers: Vec<RegisteredServer>) {
    let tasks = servers.into_iter().map(|server| async move {
        if let Err(e) = server.client.disconnect().await {
            warn!(server = %server.name, "Disconnect failed: {e}");
        }
    });
    join_all(tasks).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockClient, MockFactory};
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn config_with(servers: &[(&str, u8, bool)]) -> Configuration {
        let servers: Vec<Value> = servers
            .iter()
            .map(|(name, priority, critical)| {
                json!({
                    "name": name,
                    "transport": "sse",
                    "priority": priority,
                    "critical": critical,
                    "config": {"endpoint": format!("http://{name}.invalid/sse")}
                })
            })
            .collect();
        Configuration::from_json(
            &json!({
                "version": "1.0.0",
                "defaults": {"retry_attempts": 1, "retry_delay": 1},
                "servers": servers
            })
            .to_string(),
        )
        .unwrap()
    }

    async fn two_servers() -> (Aggregator, Arc<MockClient>, Arc<MockClient>) {
        let factory = Arc::new(MockFactory::new());
        let a = factory.add(MockClient::new("server-a").with_tool("run").with_resource("db://schema"));
        let b = factory.add(
            MockClient::new("server-b")
                .with_tool("run")
                .with_resource("db://schema")
                .with_resource("docs://readme"),
        );
        let aggregator = Aggregator::connect(
            config_with(&[("server-b", 50, false), ("server-a", 100, false)]),
            factory,
            None,
        )
        .await
        .unwrap();
        aggregator.initialize().await.unwrap();
        (aggregator, a, b)
    }

    #[tokio::test]
    async fn test_tools_are_namespaced_in_priority_order() {
        let (aggregator, _, _) = two_servers().await;
        let names: Vec<_> = aggregator.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["server-a.run", "server-b.run"]);
    }

    #[tokio::test]
    async fn test_execute_routes_to_owner_only() {
        let (aggregator, a, b) = two_servers().await;
        let result = aggregator
            .execute_tool("server-b.run", json!({"x": 1}))
            .await
            .unwrap();

        assert_eq!(result["server"], "server-b");
        assert_eq!(b.calls(), vec![("run".to_string(), json!({"x": 1}))]);
        assert!(a.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_names() {
        let (aggregator, a, b) = two_servers().await;

        let err = aggregator.execute_tool("no_dot_here", json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::InvalidToolName { .. }));
        assert!(err.is_invalid_input());

        let err = aggregator.execute_tool("server-c.run", json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::UnknownServer { ref server } if server == "server-c"));

        assert!(a.calls().is_empty());
        assert!(b.calls().is_empty());
    }

    #[tokio::test]
    async fn test_same_uri_kept_per_server_and_read_by_priority() {
        let (aggregator, a, b) = two_servers().await;

        let schema_entries: Vec<_> = aggregator
            .list_resources()
            .into_iter()
            .filter(|r| r.uri == "db://schema")
            .map(|r| r.server)
            .collect();
        assert_eq!(schema_entries, vec!["server-a", "server-b"]);

        let (_, source) = aggregator.get_resource_with_source("db://schema").await.unwrap();
        assert_eq!(source, ResourceSource::Server("server-a".to_string()));
        assert_eq!(a.reads.load(Ordering::SeqCst), 1);
        assert_eq!(b.reads.load(Ordering::SeqCst), 0);

        let (_, source) = aggregator.get_resource_with_source("docs://readme").await.unwrap();
        assert_eq!(source, ResourceSource::Server("server-b".to_string()));

        let err = aggregator.get_resource("nope://x").await.unwrap_err();
        assert!(matches!(err, McpError::ResourceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_resource_cache_serves_second_read() {
        let factory = Arc::new(MockFactory::new());
        let a = factory.add(MockClient::new("db").with_resource("db://schema"));
        let cache = Arc::new(ResourceCache::new(std::time::Duration::from_secs(60)));
        let aggregator = Aggregator::connect(config_with(&[("db", 50, false)]), factory, Some(cache))
            .await
            .unwrap();
        aggregator.initialize().await.unwrap();

        let (first, source) = aggregator.get_resource_with_source("db://schema").await.unwrap();
        assert_eq!(source, ResourceSource::Server("db".to_string()));
        let (second, source) = aggregator.get_resource_with_source("db://schema").await.unwrap();
        assert_eq!(source, ResourceSource::Cache);
        assert_eq!(first, second);
        assert_eq!(a.reads.load(Ordering::SeqCst), 1);

        assert!(aggregator.clear_cache());
        aggregator.get_resource("db://schema").await.unwrap();
        assert_eq!(a.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_critical_connect_failure_is_tolerated() {
        let factory = Arc::new(MockFactory::new());
        factory.add(MockClient::new("good").with_tool("t"));
        let bad = factory.add(MockClient::new("bad").unreachable());

        let aggregator = Aggregator::connect(
            config_with(&[("good", 50, false), ("bad", 90, false)]),
            factory,
            None,
        )
        .await
        .unwrap();
        aggregator.initialize().await.unwrap();

        assert_eq!(aggregator.get_stats().servers, vec!["good"]);
        // one retry configured
        assert_eq!(bad.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_critical_connect_failure_aborts_and_disconnects() {
        let factory = Arc::new(MockFactory::new());
        let good = factory.add(MockClient::new("good"));
        factory.add(MockClient::new("core").unreachable());

        let err = Aggregator::connect(
            config_with(&[("good", 90, false), ("core", 10, true)]),
            factory,
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, McpError::Connection { .. }));
        assert_eq!(good.disconnects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_discovery_failure_omits_or_aborts() {
        let factory = Arc::new(MockFactory::new());
        factory.add(MockClient::new("good").with_tool("t"));
        factory.add(MockClient::new("flaky").with_tool("u").failing_discovery());
        let aggregator = Aggregator::connect(
            config_with(&[("good", 50, false), ("flaky", 60, false)]),
            factory,
            None,
        )
        .await
        .unwrap();
        aggregator.initialize().await.unwrap();
        let names: Vec<_> = aggregator.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["good.t"]);
        // still registered, only absent from the catalog
        assert_eq!(aggregator.get_stats().active_servers, 2);

        let factory = Arc::new(MockFactory::new());
        factory.add(MockClient::new("flaky").failing_discovery());
        let aggregator = Aggregator::connect(config_with(&[("flaky", 60, true)]), factory, None)
            .await
            .unwrap();
        let err = aggregator.initialize().await.unwrap_err();
        assert!(matches!(err, McpError::Discovery { .. }));
    }

    #[tokio::test]
    async fn test_health_check_reports_each_server() {
        let (aggregator, _, b) = two_servers().await;
        assert!(aggregator.health_check().await.healthy);

        b.set_ping_failure(true);
        let status = aggregator.health_check().await;
        assert!(!status.healthy);
        assert!(status.servers["server-a"].healthy);
        assert!(!status.servers["server-b"].healthy);
        assert_eq!(status.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_disconnects_everyone() {
        let (aggregator, a, b) = two_servers().await;
        aggregator.shutdown().await;

        assert_eq!(a.disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(b.disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(aggregator.get_stats().active_servers, 0);
        assert!(aggregator.list_tools().is_empty());
    }

    #[tokio::test]
    async fn test_apply_configuration_reconciles() {
        let factory = Arc::new(MockFactory::new());
        let keep = factory.add(MockClient::new("keep").with_tool("k"));
        let dropped = factory.add(MockClient::new("drop").with_tool("d"));
        let bump = factory.add(MockClient::new("bump").with_tool("b"));
        factory.add(MockClient::new("fresh").with_tool("f"));

        let aggregator = Aggregator::connect(
            config_with(&[("keep", 50, false), ("drop", 50, false), ("bump", 50, false)]),
            factory.clone(),
            None,
        )
        .await
        .unwrap();
        aggregator.initialize().await.unwrap();

        let summary = aggregator
            .apply_configuration(config_with(&[
                ("keep", 50, false),
                ("bump", 80, false),
                ("fresh", 10, false),
            ]))
            .await
            .unwrap();

        assert_eq!(summary.unchanged, vec!["keep"]);
        assert_eq!(summary.reconnected, vec!["bump"]);
        assert_eq!(summary.added, vec!["fresh"]);
        assert_eq!(summary.removed, vec!["drop"]);

        assert_eq!(keep.connects.load(Ordering::SeqCst), 1);
        assert_eq!(keep.disconnects.load(Ordering::SeqCst), 0);
        assert_eq!(dropped.disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(bump.connects.load(Ordering::SeqCst), 2);

        let names: Vec<_> = aggregator.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["bump.b", "keep.k", "fresh.f"]);
    }

    #[tokio::test]
    async fn test_failed_reload_leaves_no_orphaned_tools() {
        let factory = Arc::new(MockFactory::new());
        let keep = factory.add(MockClient::new("keep").with_tool("k"));
        factory.add(MockClient::new("drop").with_tool("d"));
        factory.add(MockClient::new("core").unreachable());

        let aggregator = Aggregator::connect(
            config_with(&[("keep", 50, false), ("drop", 50, false)]),
            factory,
            None,
        )
        .await
        .unwrap();
        aggregator.initialize().await.unwrap();

        let err = aggregator
            .apply_configuration(config_with(&[("keep", 50, false), ("core", 40, true)]))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::Connection { .. }));

        assert_eq!(aggregator.get_stats().servers, vec!["keep"]);
        let names: Vec<_> = aggregator.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["keep.k"]);
        for tool in aggregator.list_tools() {
            aggregator.execute_tool(&tool.name, json!({})).await.unwrap();
        }
        assert_eq!(keep.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_reconnected_server_keeps_its_tie_position() {
        let factory = Arc::new(MockFactory::new());
        let a = factory.add(MockClient::new("a").with_resource("db://x"));
        factory.add(MockClient::new("b").with_resource("db://x"));

        let config = config_with(&[("a", 50, false), ("b", 50, false)]);
        let aggregator = Aggregator::connect(config.clone(), factory, None).await.unwrap();
        aggregator.initialize().await.unwrap();
        let (_, source) = aggregator.get_resource_with_source("db://x").await.unwrap();
        assert_eq!(source, ResourceSource::Server("a".to_string()));

        let mut edited = config;
        edited.servers[0].description = Some("primary catalog".to_string());
        let summary = aggregator.apply_configuration(edited).await.unwrap();
        assert_eq!(summary.reconnected, vec!["a"]);
        assert_eq!(a.connects.load(Ordering::SeqCst), 2);

        let (_, source) = aggregator.get_resource_with_source("db://x").await.unwrap();
        assert_eq!(source, ResourceSource::Server("a".to_string()));
        assert_eq!(aggregator.get_stats().servers, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_reload_requires_path() {
        let (aggregator, _, _) = two_servers().await;
        let err = aggregator.reload_configuration().await.unwrap_err();
        assert!(err.is_configuration());
    }

    proptest! {
        #[test]
        fn prop_namespacing_round_trips(
            server in "[a-z0-9][a-z0-9-]{0,20}",
            tool in "[A-Za-z_][A-Za-z0-9_.]{0,20}",
        ) {
            let name = namespaced_name(&server, &tool);
            let (s, t) = split_namespaced(&name).unwrap();
            prop_assert_eq!(s, server.as_str());
            prop_assert_eq!(t, tool.as_str());
        }

        #[test]
        fn prop_names_without_separator_rejected(name in "[a-z_]{1,30}") {
            prop_assert!(split_namespaced(&name).is_err());
        }
    }
}
