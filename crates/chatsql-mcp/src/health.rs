//! Health report types

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::{AdapterMode, TransportKind};

/// Reachability of one server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerHealth {
    /// Whether the probe succeeded
    pub healthy: bool,
    /// Transport used to reach the server
    pub transport: TransportKind,
    /// Configured priority
    pub priority: u8,
    /// Whether the server is critical
    pub critical: bool,
    /// Probe failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Round-trip time of the probe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health report, recomputed on every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    /// True only if every server is healthy
    pub healthy: bool,
    /// Mode of the adapter producing the report
    pub mode: AdapterMode,
    /// Per-server status by name
    pub servers: BTreeMap<String, ServerHealth>,
    /// One line per failing server
    pub errors: Vec<String>,
    /// When the report was produced
    pub checked_at: DateTime<Utc>,
}

impl HealthStatus {
    /// Build a report from per-server results
    pub fn from_servers(mode: AdapterMode, servers: BTreeMap<String, ServerHealth>) -> Self {
        let errors: Vec<String> = servers
            .iter()
            .filter_map(|(name, s)| s.error.as_ref().map(|e| format!("{name}: {e}")))
            .collect();
        Self {
            healthy: servers.values().all(|s| s.healthy),
            mode,
            servers,
            errors,
            checked_at: Utc::now(),
        }
    }

    /// Report carrying only an error, with no servers to show
    pub fn unhealthy(mode: AdapterMode, error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            mode,
            servers: BTreeMap::new(),
            errors: vec![error.into()],
            checked_at: Utc::now(),
        }
    }

    /// Names of the unhealthy servers
    pub fn unhealthy_servers(&self) -> Vec<&str> {
        self.servers
            .iter()
            .filter(|(_, s)| !s.healthy)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(healthy: bool) -> ServerHealth {
        ServerHealth {
            healthy,
            transport: TransportKind::Stdio,
            priority: 50,
            critical: false,
            error: (!healthy).then(|| "ping failed".to_string()),
            latency_ms: None,
        }
    }

    #[test]
    fn test_healthy_only_if_all_servers_are() {
        let mut servers = BTreeMap::new();
        servers.insert("a".to_string(), server(true));
        let status = HealthStatus::from_servers(AdapterMode::MultiServer, servers.clone());
        assert!(status.healthy);
        assert!(status.errors.is_empty());

        servers.insert("b".to_string(), server(false));
        let status = HealthStatus::from_servers(AdapterMode::MultiServer, servers);
        assert!(!status.healthy);
        assert_eq!(status.errors, vec!["b: ping failed"]);
        assert_eq!(status.unhealthy_servers(), vec!["b"]);
    }
}
