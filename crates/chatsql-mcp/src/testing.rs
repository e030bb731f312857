//! In-memory MCP clients for tests
//!
//! Available to the crate's own unit tests and, with the `test-utils`
//! feature, to integration tests and downstream crates. [`MockFactory`]
//! plugs into [`McpAdapter::with_client_factory`](crate::McpAdapter::with_client_factory)
//! and [`Aggregator::connect`](crate::Aggregator::connect).

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::client::{ClientFactory, McpClient, ResourceInfo, ToolInfo};
use crate::config::{Defaults, ServerDefinition, SseConfig, TransportConfig, TransportKind};
use crate::error::{McpError, McpResult};

/// Scriptable client recording every call it receives
#[derive(Debug)]
pub struct MockClient {
    name: String,
    tools: Vec<ToolInfo>,
    resources: Vec<ResourceInfo>,
    fail_connect: bool,
    fail_discovery: bool,
    fail_ping: AtomicBool,
    connected: AtomicBool,
    /// `connect` attempts
    pub connects: AtomicUsize,
    /// `disconnect` calls
    pub disconnects: AtomicUsize,
    /// `read_resource` calls
    pub reads: AtomicUsize,
    /// `call_tool` invocations as `(tool, arguments)`
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl MockClient {
    /// Reachable client with no tools or resources
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tools: Vec::new(),
            resources: Vec::new(),
            fail_connect: false,
            fail_discovery: false,
            fail_ping: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Server name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tools this client lists
    pub fn tools(&self) -> &[ToolInfo] {
        &self.tools
    }

    /// Add a tool
    pub fn with_tool(mut self, name: &str) -> Self {
        self.tools.push(ToolInfo::new(name).with_description(format!("{name} on {}", self.name)));
        self
    }

    /// Add a resource
    pub fn with_resource(mut self, uri: &str) -> Self {
        self.resources.push(ResourceInfo::new(uri));
        self
    }

    /// Make every `connect` fail
    pub fn unreachable(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Make tool and resource listing fail
    pub fn failing_discovery(mut self) -> Self {
        self.fail_discovery = true;
        self
    }

    /// Make `ping` fail even while connected
    pub fn set_ping_failure(&self, fail: bool) {
        self.fail_ping.store(fail, Ordering::SeqCst);
    }

    /// SSE definition pointing nowhere, named after the client
    pub fn definition(&self) -> ServerDefinition {
        ServerDefinition::new(
            self.name.clone(),
            TransportConfig::Sse(SseConfig {
                endpoint: format!("http://{}.invalid/sse", self.name),
                headers: HashMap::new(),
                timeout: None,
            }),
        )
    }

    /// Snapshot of the recorded tool calls
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl McpClient for MockClient {
    fn server_name(&self) -> &str {
        &self.name
    }

    fn transport(&self) -> TransportKind {
        TransportKind::Sse
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> McpResult<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(McpError::connection_to(&self.name, "connection refused"));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> McpResult<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn list_tools(&self) -> McpResult<Vec<ToolInfo>> {
        if self.fail_discovery {
            return Err(McpError::discovery(&self.name, "tools/list failed"));
        }
        Ok(self.tools.clone())
    }

    async fn list_resources(&self) -> McpResult<Vec<ResourceInfo>> {
        if self.fail_discovery {
            return Err(McpError::discovery(&self.name, "resources/list failed"));
        }
        Ok(self.resources.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<Value> {
        self.calls.lock().push((name.to_string(), arguments.clone()));
        if name == "fail" {
            return Err(McpError::Protocol {
                code: -32000,
                message: "tool failed".to_string(),
            });
        }
        Ok(json!({"server": self.name, "tool": name, "arguments": arguments}))
    }

    async fn read_resource(&self, uri: &str) -> McpResult<Value> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"contents": [{"uri": uri, "text": format!("from {}", self.name)}]}))
    }

    async fn ping(&self) -> McpResult<()> {
        if !self.is_connected() {
            return Err(McpError::transport("not connected"));
        }
        if self.fail_ping.load(Ordering::SeqCst) {
            return Err(McpError::transport("ping failed"));
        }
        Ok(())
    }
}

/// Factory handing out pre-built mock clients by server name
///
/// Names without a registered client get an unreachable one.
#[derive(Debug, Default)]
pub struct MockFactory {
    clients: Mutex<HashMap<String, Arc<MockClient>>>,
    created: Mutex<Vec<String>>,
}

impl MockFactory {
    /// Factory with no clients
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client, returning a handle for assertions
    pub fn add(&self, client: MockClient) -> Arc<MockClient> {
        let client = Arc::new(client);
        self.clients.lock().insert(client.name.clone(), Arc::clone(&client));
        client
    }

    /// Server names `create` was called for, in order
    pub fn created(&self) -> Vec<String> {
        self.created.lock().clone()
    }
}

impl ClientFactory for MockFactory {
    fn create(&self, definition: &ServerDefinition, _defaults: &Defaults) -> McpResult<Arc<dyn McpClient>> {
        self.created.lock().push(definition.name.clone());
        let client: Arc<dyn McpClient> = self
            .clients
            .lock()
            .get(&definition.name)
            .cloned()
            .unwrap_or_else(|| Arc::new(MockClient::new(&definition.name).unreachable()));
        Ok(client)
    }
}
