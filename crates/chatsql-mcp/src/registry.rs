//! Server registry
//!
//! Bookkeeping of connected clients by server name. The registry never
//! connects or disconnects anything itself.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::McpClient;
use crate::config::ServerDefinition;
use crate::error::{McpError, McpResult};

/// A registered server: its client and the definition it was built from
#[derive(Clone)]
pub struct RegisteredServer {
    /// Server name
    pub name: String,
    /// Connected client
    pub client: Arc<dyn McpClient>,
    /// Definition the client was created from
    pub definition: ServerDefinition,
}

impl std::fmt::Debug for RegisteredServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredServer")
            .field("name", &self.name)
            .field("transport", &self.client.transport())
            .field("priority", &self.definition.priority)
            .finish_non_exhaustive()
    }
}

/// Name-keyed store of registered servers
#[derive(Debug, Default)]
pub struct ServerRegistry {
    servers: HashMap<String, RegisteredServer>,
    // tie-break order for equal priorities
    order: Vec<String>,
}

impl ServerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a server
    ///
    /// # Errors
    ///
    /// Returns `McpError::DuplicateServer` if `name` is already registered.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        client: Arc<dyn McpClient>,
        definition: ServerDefinition,
    ) -> McpResult<()> {
        let name = name.into();
        if self.servers.contains_key(&name) {
            return Err(McpError::DuplicateServer { name });
        }
        self.order.push(name.clone());
        self.servers.insert(
            name.clone(),
            RegisteredServer {
                name,
                client,
                definition,
            },
        );
        Ok(())
    }

    /// Remove a server, returning its registration
    pub fn remove(&mut self, name: &str) -> Option<RegisteredServer> {
        self.order.retain(|n| n != name);
        self.servers.remove(name)
    }

    /// Reorder servers to follow `names`; names not listed keep their
    /// relative order after the listed ones
    pub fn arrange(&mut self, names: &[&str]) {
        self.order.sort_by_key(|name| {
            names
                .iter()
                .position(|n| *n == name.as_str())
                .unwrap_or(names.len())
        });
    }

    /// Look up a server
    pub fn get(&self, name: &str) -> Option<&RegisteredServer> {
        self.servers.get(name)
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.servers.contains_key(name)
    }

    /// All servers in registration order (or as last [`arrange`](Self::arrange)d)
    pub fn all(&self) -> Vec<&RegisteredServer> {
        self.order.iter().filter_map(|n| self.servers.get(n)).collect()
    }

    /// All servers, highest priority first (ties in registry order)
    pub fn by_priority(&self) -> Vec<&RegisteredServer> {
        let mut servers = self.all();
        servers.sort_by(|a, b| b.definition.priority.cmp(&a.definition.priority));
        servers
    }

    /// Registered server names in registration order
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Number of registered servers
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
