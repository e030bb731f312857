//! Adapter façade
//!
//! [`McpAdapter`] is the single entry point of the aggregation layer. On
//! `initialize` it selects an operating mode and builds the matching
//! backend:
//!
//! - `MULTI_SERVER`: every configured server behind an [`Aggregator`], tool
//!   names of the form `server.tool`
//! - `SINGLE_SERVER`: one legacy client, tool names unprefixed
//! - `AUTO`: multi-server when the configuration file loads and lists at
//!   least one server, single-server otherwise
//!
//! When multi-server startup fails and fallback is enabled the adapter
//! drops to single-server mode instead of failing.
//!
//! ```rust,no_run
//! use chatsql_mcp::{AdapterMode, AdapterSettings, McpAdapter};
//!
//! # async fn run() -> chatsql_mcp::McpResult<()> {
//! let adapter = McpAdapter::new(AdapterSettings::new(AdapterMode::Auto, "mcp_servers.json"));
//! adapter.initialize().await?;
//! for tool in adapter.list_tools().await? {
//!     println!("{}", tool.name);
//! }
//! adapter.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod stats;

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::aggregator::{Aggregator, NamespacedResource, NamespacedTool, ReloadSummary, ResourceSource};
use crate::cache::ResourceCache;
use crate::client::{ClientFactory, ClientInfo, McpClient, TransportClientFactory};
use crate::config::settings::LEGACY_SERVER_NAME;
use crate::config::server::DEFAULT_PRIORITY;
use crate::config::{AdapterMode, AdapterSettings, Configuration, Defaults, TransportKind};
use crate::error::{McpError, McpResult};
use crate::health::{HealthStatus, ServerHealth};

pub use stats::{AdapterMetrics, RuntimeStats};

#[derive(Clone)]
enum Backend {
    Uninitialized,
    /// `None` when the legacy client could not be created or connected
    Single(Option<Arc<dyn McpClient>>),
    Multi(Arc<Aggregator>),
}

impl Backend {
    fn mode(&self) -> Option<AdapterMode> {
        match self {
            Self::Uninitialized => None,
            Self::Single(_) => Some(AdapterMode::SingleServer),
            Self::Multi(_) => Some(AdapterMode::MultiServer),
        }
    }
}

/// Façade over the single- or multi-server backend
pub struct McpAdapter {
    settings: AdapterSettings,
    factory: Arc<dyn ClientFactory>,
    backend: RwLock<Backend>,
    init_lock: tokio::sync::Mutex<()>,
    metrics: AdapterMetrics,
}

impl std::fmt::Debug for McpAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpAdapter")
            .field("requested_mode", &self.settings.mode)
            .field("mode", &self.backend.read().mode())
            .field("config_path", &self.settings.config_path)
            .field("fallback_enabled", &self.settings.fallback_enabled)
            .finish_non_exhaustive()
    }
}

impl McpAdapter {
    /// Adapter using the transport client factory
    pub fn new(settings: AdapterSettings) -> Self {
        let factory = TransportClientFactory::new(ClientInfo {
            name: settings.client_name.clone(),
            version: settings.client_version.clone(),
        });
        Self {
            settings,
            factory: Arc::new(factory),
            backend: RwLock::new(Backend::Uninitialized),
            init_lock: tokio::sync::Mutex::new(()),
            metrics: AdapterMetrics::new(),
        }
    }

    /// Replace the client factory
    pub fn with_client_factory(mut self, factory: Arc<dyn ClientFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Settings this adapter was built with
    pub fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    /// Current mode: the selected mode once initialized, the requested one before
    pub fn get_mode(&self) -> AdapterMode {
        self.backend.read().mode().unwrap_or(self.settings.mode)
    }

    /// Whether `initialize` has completed
    pub fn is_initialized(&self) -> bool {
        !matches!(*self.backend.read(), Backend::Uninitialized)
    }

    fn backend(&self) -> McpResult<Backend> {
        match &*self.backend.read() {
            Backend::Uninitialized => Err(McpError::NotInitialized),
            backend => Ok(backend.clone()),
        }
    }

    /// Select the operating mode and build its backend
    ///
    /// Calling it again after success is a logged no-op.
    ///
    /// # Errors
    ///
    /// Returns `McpError::Initialization` when multi-server startup fails
    /// and fallback is disabled.
    pub async fn initialize(&self) -> McpResult<()> {
        let _init = self.init_lock.lock().await;
        if self.is_initialized() {
            warn!("Adapter already initialized, ignoring");
            return Ok(());
        }

        self.metrics.reset();
        let mode = match self.settings.mode {
            AdapterMode::Auto => self.detect_mode(),
            explicit => explicit,
        };
        info!(requested = %self.settings.mode, selected = %mode, "Initializing adapter");

        let backend = match mode {
            AdapterMode::MultiServer => match self.build_multi().await {
                Ok(aggregator) => Backend::Multi(Arc::new(aggregator)),
                Err(e) if self.settings.fallback_enabled => {
                    warn!("Multi-server initialization failed, falling back to single-server mode: {e}");
                    self.build_single().await
                }
                Err(e) => {
                    error!("Multi-server initialization failed: {e}");
                    return Err(McpError::initialization("multi-server initialization failed", e));
                }
            },
            AdapterMode::SingleServer | AdapterMode::Auto => self.build_single().await,
        };

        info!(mode = ?backend.mode(), "Adapter initialized");
        *self.backend.write() = backend;
        Ok(())
    }

    fn detect_mode(&self) -> AdapterMode {
        match Configuration::load(&self.settings.config_path) {
            Ok(config) if !config.servers.is_empty() => {
                debug!(path = %self.settings.config_path.display(), "Found multi-server configuration");
                AdapterMode::MultiServer
            }
            Ok(_) => AdapterMode::SingleServer,
            Err(e) => {
                debug!(
                    path = %self.settings.config_path.display(),
                    "No usable multi-server configuration: {e}"
                );
                AdapterMode::SingleServer
            }
        }
    }

    async fn build_multi(&self) -> McpResult<Aggregator> {
        let config = Configuration::load(&self.settings.config_path)?;
        let cache = self.settings.cache_ttl.map(|ttl| Arc::new(ResourceCache::new(ttl)));

        let aggregator = Aggregator::connect(config, Arc::clone(&self.factory), cache)
            .await?
            .with_config_path(self.settings.config_path.clone());

        if let Err(e) = aggregator.initialize().await {
            aggregator.shutdown().await;
            return Err(e);
        }
        Ok(aggregator)
    }

    async fn build_single(&self) -> Backend {
        let Some(definition) = &self.settings.legacy_server else {
            warn!("No legacy server configured, single-server backend unavailable");
            return Backend::Single(None);
        };

        let client = match self.factory.create(definition, &Defaults::default()) {
            Ok(client) => client,
            Err(e) => {
                warn!(server = %definition.name, "Failed to create legacy client: {e}");
                return Backend::Single(None);
            }
        };

        match client.connect().await {
            Ok(()) => {
                info!(server = %definition.name, "Connected to legacy server");
                Backend::Single(Some(client))
            }
            Err(e) => {
                warn!(server = %definition.name, "Legacy server unavailable: {e}");
                Backend::Single(None)
            }
        }
    }

    /// Apply the listing failure policy
    fn degrade<T>(&self, operation: &str, error: McpError) -> McpResult<Vec<T>> {
        self.metrics.inc_errors();
        if self.settings.fallback_enabled {
            warn!("{operation} failed, returning no results: {error}");
            Ok(Vec::new())
        } else {
            Err(error)
        }
    }

    fn legacy_name(&self) -> String {
        self.settings
            .legacy_server
            .as_ref()
            .map_or_else(|| LEGACY_SERVER_NAME.to_string(), |d| d.name.clone())
    }

    /// Tools of the active backend
    ///
    /// Multi-server names are `server.tool`; single-server names are bare.
    ///
    /// # Errors
    ///
    /// Returns `McpError::NotInitialized` before `initialize`, and a backend
    /// error only when fallback is disabled.
    pub async fn list_tools(&self) -> McpResult<Vec<NamespacedTool>> {
        match self.backend()? {
            Backend::Multi(aggregator) => Ok(aggregator.list_tools()),
            Backend::Single(Some(client)) => match client.list_tools().await {
                Ok(tools) => {
                    let server = client.server_name().to_string();
                    Ok(tools
                        .into_iter()
                        .map(|t| NamespacedTool {
                            name: t.name.clone(),
                            server: server.clone(),
                            original_name: t.name,
                            description: t.description,
                            input_schema: t.input_schema,
                        })
                        .collect())
                }
                Err(e) => self.degrade("list_tools", e),
            },
            Backend::Single(None) | Backend::Uninitialized => {
                warn!("list_tools called without a backend");
                Ok(Vec::new())
            }
        }
    }

    /// Resources of the active backend
    ///
    /// # Errors
    ///
    /// Returns `McpError::NotInitialized` before `initialize`, and a backend
    /// error only when fallback is disabled.
    pub async fn list_resources(&self) -> McpResult<Vec<NamespacedResource>> {
        match self.backend()? {
            Backend::Multi(aggregator) => Ok(aggregator.list_resources()),
            Backend::Single(Some(client)) => match client.list_resources().await {
                Ok(resources) => {
                    let server = client.server_name().to_string();
                    Ok(resources
                        .into_iter()
                        .map(|r| NamespacedResource {
                            uri: r.uri,
                            server: server.clone(),
                            name: r.name,
                            description: r.description,
                            mime_type: r.mime_type,
                        })
                        .collect())
                }
                Err(e) => self.degrade("list_resources", e),
            },
            Backend::Single(None) | Backend::Uninitialized => {
                warn!("list_resources called without a backend");
                Ok(Vec::new())
            }
        }
    }

    /// Execute a tool on the active backend
    ///
    /// Failures are always returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns routing errors (multi-server mode), `McpError::NotConnected`
    /// when single-server mode has no client, or the backend's error.
    pub async fn execute_tool(&self, name: &str, arguments: Value) -> McpResult<Value> {
        let backend = self.backend()?;
        self.metrics.inc_requests();
        let started = Instant::now();

        let result = match backend {
            Backend::Multi(aggregator) => aggregator.execute_tool(name, arguments).await,
            Backend::Single(Some(client)) => client.call_tool(name, arguments).await,
            Backend::Single(None) | Backend::Uninitialized => Err(McpError::NotConnected {
                server: self.legacy_name(),
            }),
        };

        let elapsed = started.elapsed();
        self.metrics.record_latency(elapsed);
        match &result {
            Ok(_) => debug!(tool = name, elapsed_ms = elapsed.as_millis() as u64, "Tool executed"),
            Err(e) => {
                self.metrics.inc_errors();
                warn!(tool = name, "Tool execution failed: {e}");
            }
        }
        result
    }

    /// Read a resource from the active backend
    ///
    /// # Errors
    ///
    /// Returns `McpError::ResourceNotFound` (multi-server mode),
    /// `McpError::NotConnected` when single-server mode has no client, or
    /// the backend's error.
    pub async fn get_resource(&self, uri: &str) -> McpResult<Value> {
        let backend = self.backend()?;
        self.metrics.inc_requests();

        let result = match backend {
            Backend::Multi(aggregator) => {
                let read = aggregator.get_resource_with_source(uri).await;
                if let Ok((_, source)) = &read
                    && aggregator.cache().is_some()
                {
                    match source {
                        ResourceSource::Cache => self.metrics.inc_cache_hits(),
                        ResourceSource::Server(_) => self.metrics.inc_cache_misses(),
                    }
                }
                read.map(|(value, _)| value)
            }
            Backend::Single(Some(client)) => client.read_resource(uri).await,
            Backend::Single(None) | Backend::Uninitialized => Err(McpError::NotConnected {
                server: self.legacy_name(),
            }),
        };

        if let Err(e) = &result {
            self.metrics.inc_errors();
            warn!(uri, "Resource read failed: {e}");
        }
        result
    }

    /// Runtime statistics
    pub fn get_stats(&self) -> RuntimeStats {
        let backend = self.backend.read().clone();
        let (active_servers, total_tools, total_resources, cache) = match &backend {
            Backend::Multi(aggregator) => {
                let stats = aggregator.get_stats();
                (stats.active_servers, stats.total_tools, stats.total_resources, stats.cache)
            }
            Backend::Single(_) => (1, 0, 0, None),
            Backend::Uninitialized => (0, 0, 0, None),
        };

        RuntimeStats {
            mode: backend.mode(),
            active_servers,
            total_tools,
            total_resources,
            cache_hit_ratio: self.metrics.cache_hit_ratio(),
            average_latency: self.metrics.average_latency_ms(),
            total_requests: self.metrics.total_requests(),
            error_count: self.metrics.error_count(),
            cache,
        }
    }

    /// Health report, recomputed on every call
    ///
    /// Single-server mode reports its one server healthy without probing it.
    pub async fn health_check(&self) -> HealthStatus {
        let backend = self.backend.read().clone();
        match backend {
            Backend::Multi(aggregator) => aggregator.health_check().await,
            Backend::Single(_) => {
                let (transport, priority) = self
                    .settings
                    .legacy_server
                    .as_ref()
                    .map_or((TransportKind::Sse, DEFAULT_PRIORITY), |d| (d.transport(), d.priority));
                let servers = BTreeMap::from([(
                    self.legacy_name(),
                    ServerHealth {
                        healthy: true,
                        transport,
                        priority,
                        critical: false,
                        error: None,
                        latency_ms: None,
                    },
                )]);
                HealthStatus::from_servers(AdapterMode::SingleServer, servers)
            }
            Backend::Uninitialized => HealthStatus::unhealthy(self.settings.mode, "adapter not initialized"),
        }
    }

    /// Disconnect the backend; a second call does nothing
    pub async fn shutdown(&self) {
        let _init = self.init_lock.lock().await;
        let backend = std::mem::replace(&mut *self.backend.write(), Backend::Uninitialized);
        match backend {
            Backend::Multi(aggregator) => aggregator.shutdown().await,
            Backend::Single(Some(client)) => {
                if let Err(e) = client.disconnect().await {
                    warn!(server = %client.server_name(), "Disconnect failed: {e}");
                }
            }
            Backend::Single(None) => {}
            Backend::Uninitialized => {
                debug!("Adapter already shut down");
                return;
            }
        }
        info!("Adapter shut down");
    }

    /// Reload the server configuration (multi-server mode only)
    ///
    /// Returns `None` in single-server mode, where reloading is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `McpError::NotInitialized` before `initialize`, or the
    /// aggregator's reload error.
    pub async fn reload_configuration(&self) -> McpResult<Option<ReloadSummary>> {
        match self.backend()? {
            Backend::Multi(aggregator) => match aggregator.reload_configuration().await {
                Ok(summary) => Ok(Some(summary)),
                Err(e) => {
                    self.metrics.inc_errors();
                    Err(e)
                }
            },
            _ => {
                warn!("reload_configuration ignored in single-server mode");
                Ok(None)
            }
        }
    }

    /// Clear the backend's resource cache and reset the adapter's cache counters
    pub fn clear_cache(&self) {
        if let Backend::Multi(aggregator) = &*self.backend.read() {
            aggregator.clear_cache();
        }
        self.metrics.reset_cache_counters();
    }

    /// Direct access to the aggregator in multi-server mode
    pub fn aggregator(&self) -> Option<Arc<Aggregator>> {
        match &*self.backend.read() {
            Backend::Multi(aggregator) => Some(Arc::clone(aggregator)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockClient, MockFactory};
    use serde_json::json;
    use std::io::Write;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn write_config(servers: &[(&str, u8, bool)]) -> NamedTempFile {
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
        let mut file = NamedTempFile::new().unwrap();
        let doc = json!({
            "version": "1.0.0",
            "defaults": {"retry_attempts": 0, "retry_delay": 1},
            "servers": servers
        });
        file.write_all(doc.to_string().as_bytes()).unwrap();
        file
    }

    fn adapter(mode: AdapterMode, path: impl Into<std::path::PathBuf>, factory: &Arc<MockFactory>) -> McpAdapter {
        let settings = AdapterSettings::new(mode, path).with_legacy_endpoint("http://legacy.invalid/sse");
        McpAdapter::new(settings).with_client_factory(Arc::clone(factory) as Arc<dyn ClientFactory>)
    }

    #[tokio::test]
    async fn test_auto_without_config_selects_single_server() {
        let factory = Arc::new(MockFactory::new());
        factory.add(MockClient::new(LEGACY_SERVER_NAME).with_tool("query"));
        let adapter = adapter(AdapterMode::Auto, "/nonexistent/mcp_servers.json", &factory);

        assert_eq!(adapter.get_mode(), AdapterMode::Auto);
        adapter.initialize().await.unwrap();
        assert_eq!(adapter.get_mode(), AdapterMode::SingleServer);

        let names: Vec<_> = adapter.list_tools().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["query"]);
    }

    #[tokio::test]
    async fn test_auto_with_config_selects_multi_server() {
        let factory = Arc::new(MockFactory::new());
        factory.add(MockClient::new("sqlite-db").with_tool("run"));
        let file = write_config(&[("sqlite-db", 100, true)]);
        let adapter = adapter(AdapterMode::Auto, file.path(), &factory);

        adapter.initialize().await.unwrap();
        assert_eq!(adapter.get_mode(), AdapterMode::MultiServer);
        assert!(adapter.aggregator().is_some());
    }

    #[tokio::test]
    async fn test_multi_server_tools_are_namespaced_and_routed() {
        let factory = Arc::new(MockFactory::new());
        let a = factory.add(MockClient::new("server-a").with_tool("run"));
        let b = factory.add(MockClient::new("server-b").with_tool("run"));
        let file = write_config(&[("server-a", 100, false), ("server-b", 50, false)]);
        let adapter = adapter(AdapterMode::MultiServer, file.path(), &factory);
        adapter.initialize().await.unwrap();

        let names: Vec<_> = adapter.list_tools().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["server-a.run", "server-b.run"]);

        adapter.execute_tool("server-b.run", json!({"x": 1})).await.unwrap();
        assert_eq!(b.calls(), vec![("run".to_string(), json!({"x": 1}))]);
        assert!(a.calls().is_empty());

        let stats = adapter.get_stats();
        assert_eq!(stats.mode, Some(AdapterMode::MultiServer));
        assert_eq!(stats.active_servers, 2);
        assert_eq!(stats.total_tools, 2);
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.error_count, 0);
    }

    #[tokio::test]
    async fn test_critical_failure_falls_back_to_single_server() {
        let factory = Arc::new(MockFactory::new());
        factory.add(MockClient::new("sqlite-db").unreachable());
        let legacy = factory.add(MockClient::new(LEGACY_SERVER_NAME).with_tool("query"));
        let file = write_config(&[("sqlite-db", 100, true)]);
        let adapter = adapter(AdapterMode::MultiServer, file.path(), &factory);

        adapter.initialize().await.unwrap();
        assert_eq!(adapter.get_mode(), AdapterMode::SingleServer);

        adapter.execute_tool("query", json!({"sql": "SELECT 1"})).await.unwrap();
        assert_eq!(legacy.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_critical_failure_without_fallback_is_an_error() {
        let factory = Arc::new(MockFactory::new());
        factory.add(MockClient::new("sqlite-db").unreachable());
        let file = write_config(&[("sqlite-db", 100, true)]);
        let settings = AdapterSettings::new(AdapterMode::MultiServer, file.path()).with_fallback(false);
        let adapter = McpAdapter::new(settings).with_client_factory(factory as Arc<dyn ClientFactory>);

        let err = adapter.initialize().await.unwrap_err();
        assert!(matches!(err, McpError::Initialization { .. }));
        assert!(!adapter.is_initialized());
    }

    #[tokio::test]
    async fn test_fallback_health_is_synthesized() {
        let factory = Arc::new(MockFactory::new());
        factory.add(MockClient::new("sqlite-db").unreachable());
        let file = write_config(&[("sqlite-db", 100, true)]);
        let adapter = adapter(AdapterMode::MultiServer, file.path(), &factory);
        adapter.initialize().await.unwrap();

        let health = adapter.health_check().await;
        assert!(health.healthy);
        assert_eq!(health.mode, AdapterMode::SingleServer);
        assert!(health.servers.contains_key(LEGACY_SERVER_NAME));
    }

    #[tokio::test]
    async fn test_single_server_without_client_reports_not_connected() {
        let factory = Arc::new(MockFactory::new());
        let adapter = adapter(AdapterMode::SingleServer, "/nonexistent.json", &factory);
        adapter.initialize().await.unwrap();

        assert!(adapter.list_tools().await.unwrap().is_empty());
        let err = adapter.execute_tool("query", json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::NotConnected { .. }));
        assert_eq!(adapter.get_stats().error_count, 1);
    }

    #[tokio::test]
    async fn test_calls_before_initialize_are_rejected() {
        let factory = Arc::new(MockFactory::new());
        let adapter = adapter(AdapterMode::SingleServer, "/nonexistent.json", &factory);

        assert!(matches!(adapter.list_tools().await, Err(McpError::NotInitialized)));
        assert!(matches!(
            adapter.execute_tool("query", json!({})).await,
            Err(McpError::NotInitialized)
        ));
        assert!(!adapter.health_check().await.healthy);
        assert_eq!(adapter.get_stats().mode, None);
    }

    #[tokio::test]
    async fn test_second_initialize_is_a_no_op() {
        let factory = Arc::new(MockFactory::new());
        let legacy = factory.add(MockClient::new(LEGACY_SERVER_NAME));
        let adapter = adapter(AdapterMode::SingleServer, "/nonexistent.json", &factory);

        adapter.initialize().await.unwrap();
        adapter.initialize().await.unwrap();
        assert_eq!(legacy.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let factory = Arc::new(MockFactory::new());
        let client = factory.add(MockClient::new("sqlite-db").with_tool("run"));
        let file = write_config(&[("sqlite-db", 100, false)]);
        let adapter = adapter(AdapterMode::MultiServer, file.path(), &factory);
        adapter.initialize().await.unwrap();

        adapter.shutdown().await;
        adapter.shutdown().await;
        assert_eq!(client.disconnects.load(Ordering::SeqCst), 1);
        assert!(!adapter.is_initialized());
    }

    #[tokio::test]
    async fn test_resource_reads_track_cache_ratio() {
        let factory = Arc::new(MockFactory::new());
        let client = factory.add(MockClient::new("sqlite-db").with_resource("db://schema"));
        let file = write_config(&[("sqlite-db", 100, false)]);
        let settings = AdapterSettings::new(AdapterMode::MultiServer, file.path())
            .with_cache_ttl(Some(Duration::from_secs(60)));
        let adapter = McpAdapter::new(settings).with_client_factory(Arc::clone(&factory) as Arc<dyn ClientFactory>);
        adapter.initialize().await.unwrap();

        adapter.get_resource("db://schema").await.unwrap();
        adapter.get_resource("db://schema").await.unwrap();
        assert_eq!(client.reads.load(Ordering::SeqCst), 1);
        assert!((adapter.get_stats().cache_hit_ratio - 0.5).abs() < f64::EPSILON);

        adapter.clear_cache();
        assert_eq!(adapter.get_stats().cache_hit_ratio, 0.0);
        adapter.get_resource("db://schema").await.unwrap();
        assert_eq!(client.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reload_is_ignored_in_single_server_mode() {
        let factory = Arc::new(MockFactory::new());
        factory.add(MockClient::new(LEGACY_SERVER_NAME));
        let adapter = adapter(AdapterMode::SingleServer, "/nonexistent.json", &factory);
        adapter.initialize().await.unwrap();

        assert_eq!(adapter.reload_configuration().await.unwrap(), None);
    }
}
