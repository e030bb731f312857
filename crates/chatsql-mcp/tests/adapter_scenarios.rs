//! End-to-end adapter behaviour over in-memory servers

mod common;

use chatsql_mcp::cache::{ManualClock, ResourceCache};
use chatsql_mcp::prelude::*;
use chatsql_mcp::testing::{MockClient, MockFactory};
use common::{sse_config, write_config};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn adapter_for(mode: AdapterMode, path: &std::path::Path, factory: &Arc<MockFactory>, fallback: bool) -> McpAdapter {
    let settings = AdapterSettings::new(mode, path)
        .with_fallback(fallback)
        .with_legacy_endpoint("http://localhost:8000/sse");
    McpAdapter::new(settings).with_client_factory(Arc::clone(factory) as Arc<dyn ClientFactory>)
}

#[tokio::test]
async fn test_two_servers_are_namespaced_by_priority_and_routed() {
    let factory = Arc::new(MockFactory::new());
    let a = factory.add(MockClient::new("server-a").with_tool("run"));
    let b = factory.add(MockClient::new("server-b").with_tool("run"));
    let file = write_config(&sse_config(&[("server-b", 50, false), ("server-a", 100, false)]));

    let adapter = adapter_for(AdapterMode::MultiServer, file.path(), &factory, true);
    adapter.initialize().await.unwrap();

    let tools: Vec<String> = adapter.list_tools().await.unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(tools, vec!["server-a.run", "server-b.run"]);

    let result = adapter.execute_tool("server-b.run", json!({"x": 1})).await.unwrap();
    assert_eq!(result["server"], "server-b");
    assert_eq!(b.calls(), vec![("run".to_string(), json!({"x": 1}))]);
    assert!(a.calls().is_empty());

    adapter.shutdown().await;
    assert_eq!(a.disconnects.load(Ordering::SeqCst), 1);
    assert_eq!(b.disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_every_listed_tool_routes_back_to_its_owner() {
    let factory = Arc::new(MockFactory::new());
    let servers = [
        factory.add(MockClient::new("sqlite-db").with_tool("query").with_tool("describe")),
        factory.add(MockClient::new("schema-docs").with_tool("describe")),
        factory.add(MockClient::new("product-metadata").with_tool("lookup")),
    ];
    let file = write_config(&sse_config(&[
        ("sqlite-db", 100, true),
        ("schema-docs", 60, false),
        ("product-metadata", 30, false),
    ]));
    let adapter = adapter_for(AdapterMode::MultiServer, file.path(), &factory, true);
    adapter.initialize().await.unwrap();

    let tools = adapter.list_tools().await.unwrap();
    assert_eq!(tools.len(), 4);
    for tool in &tools {
        assert_eq!(tool.name, format!("{}.{}", tool.server, tool.original_name));
        adapter.execute_tool(&tool.name, json!({})).await.unwrap();
    }

    for server in &servers {
        let expected: Vec<String> = server.tools().iter().map(|t| t.name.clone()).collect();
        let called: Vec<String> = server.calls().into_iter().map(|(name, _)| name).collect();
        assert_eq!(called, expected, "calls routed to {}", server.name());
    }
}

#[tokio::test]
async fn test_malformed_tool_name_contacts_no_server() {
    let factory = Arc::new(MockFactory::new());
    let db = factory.add(MockClient::new("sqlite-db").with_tool("query"));
    let file = write_config(&sse_config(&[("sqlite-db", 100, true)]));
    let adapter = adapter_for(AdapterMode::MultiServer, file.path(), &factory, true);
    adapter.initialize().await.unwrap();

    let err = adapter.execute_tool("no_dot_here", json!({})).await.unwrap_err();
    assert!(err.is_invalid_input());
    assert!(err.to_string().contains("no_dot_here"));

    let err = adapter.execute_tool("ghost.query", json!({})).await.unwrap_err();
    assert!(matches!(err, McpError::UnknownServer { .. }));

    assert!(db.calls().is_empty());
    assert_eq!(adapter.get_stats().error_count, 2);
}

#[tokio::test]
async fn test_unreachable_critical_server_falls_back() {
    let factory = Arc::new(MockFactory::new());
    factory.add(MockClient::new("sqlite-db").unreachable());
    let legacy = factory.add(MockClient::new("default").with_tool("query"));
    let file = write_config(&sse_config(&[("sqlite-db", 100, true)]));

    let adapter = adapter_for(AdapterMode::MultiServer, file.path(), &factory, true);
    adapter.initialize().await.unwrap();
    assert_eq!(adapter.get_mode(), AdapterMode::SingleServer);

    let tools: Vec<String> = adapter.list_tools().await.unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(tools, vec!["query"]);
    adapter.execute_tool("query", json!({"sql": "SELECT 1"})).await.unwrap();
    assert_eq!(legacy.calls().len(), 1);

    let health = adapter.health_check().await;
    assert!(health.healthy);
    assert_eq!(health.mode, AdapterMode::SingleServer);
    assert_eq!(health.servers.keys().collect::<Vec<_>>(), vec!["default"]);
}

#[tokio::test]
async fn test_unreachable_critical_server_without_fallback_fails() {
    let factory = Arc::new(MockFactory::new());
    factory.add(MockClient::new("sqlite-db").unreachable());
    let file = write_config(&sse_config(&[("sqlite-db", 100, true)]));

    let adapter = adapter_for(AdapterMode::MultiServer, file.path(), &factory, false);
    let err = adapter.initialize().await.unwrap_err();

    assert!(matches!(err, McpError::Initialization { .. }), "got {err:?}");
    assert!(!adapter.is_initialized());
}

#[tokio::test]
async fn test_unreachable_optional_server_is_skipped() {
    let factory = Arc::new(MockFactory::new());
    factory.add(MockClient::new("sqlite-db").with_tool("query"));
    factory.add(MockClient::new("schema-docs").with_tool("describe").unreachable());
    let file = write_config(&sse_config(&[("sqlite-db", 100, true), ("schema-docs", 50, false)]));

    let adapter = adapter_for(AdapterMode::MultiServer, file.path(), &factory, false);
    adapter.initialize().await.unwrap();

    assert_eq!(adapter.get_mode(), AdapterMode::MultiServer);
    let tools: Vec<String> = adapter.list_tools().await.unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(tools, vec!["sqlite-db.query"]);
    assert_eq!(adapter.get_stats().active_servers, 1);
}

#[tokio::test]
async fn test_auto_mode_detection() {
    let factory = Arc::new(MockFactory::new());
    factory.add(MockClient::new("sqlite-db").with_tool("query"));
    factory.add(MockClient::new("default").with_tool("query"));

    let dir = tempfile::tempdir().unwrap();
    let missing = adapter_for(AdapterMode::Auto, &dir.path().join("missing.json"), &factory, true);
    missing.initialize().await.unwrap();
    assert_eq!(missing.get_mode(), AdapterMode::SingleServer);

    let file = write_config(&sse_config(&[("sqlite-db", 100, true)]));
    let configured = adapter_for(AdapterMode::Auto, file.path(), &factory, true);
    configured.initialize().await.unwrap();
    assert_eq!(configured.get_mode(), AdapterMode::MultiServer);

    let broken = write_config(&json!({"version": "one", "servers": []}));
    let invalid = adapter_for(AdapterMode::Auto, broken.path(), &factory, true);
    invalid.initialize().await.unwrap();
    assert_eq!(invalid.get_mode(), AdapterMode::SingleServer);
}

#[tokio::test]
async fn test_health_reports_a_failing_server() {
    let factory = Arc::new(MockFactory::new());
    let docs = factory.add(MockClient::new("schema-docs").with_tool("describe"));
    factory.add(MockClient::new("sqlite-db").with_tool("query"));
    let file = write_config(&sse_config(&[("sqlite-db", 100, true), ("schema-docs", 50, false)]));
    let adapter = adapter_for(AdapterMode::MultiServer, file.path(), &factory, true);
    adapter.initialize().await.unwrap();
    assert!(adapter.health_check().await.healthy);

    docs.disconnect().await.unwrap();
    let health = adapter.health_check().await;
    assert!(!health.healthy);
    assert_eq!(health.unhealthy_servers(), vec!["schema-docs"]);
    assert!(health.servers["sqlite-db"].healthy);
}

#[tokio::test]
async fn test_reload_adds_and_removes_servers() {
    let factory = Arc::new(MockFactory::new());
    let db = factory.add(MockClient::new("sqlite-db").with_tool("query"));
    let docs = factory.add(MockClient::new("schema-docs").with_tool("describe"));
    factory.add(MockClient::new("product-metadata").with_tool("lookup"));

    let file = write_config(&sse_config(&[("sqlite-db", 100, true), ("schema-docs", 50, false)]));
    let adapter = adapter_for(AdapterMode::MultiServer, file.path(), &factory, true);
    adapter.initialize().await.unwrap();

    std::fs::write(
        file.path(),
        sse_config(&[("sqlite-db", 100, true), ("product-metadata", 40, false)]).to_string(),
    )
    .unwrap();
    let summary = adapter.reload_configuration().await.unwrap().unwrap();

    assert_eq!(summary.added, vec!["product-metadata"]);
    assert_eq!(summary.removed, vec!["schema-docs"]);
    assert_eq!(summary.unchanged, vec!["sqlite-db"]);
    assert_eq!(db.connects.load(Ordering::SeqCst), 1);
    assert_eq!(docs.disconnects.load(Ordering::SeqCst), 1);

    let tools: Vec<String> = adapter.list_tools().await.unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(tools, vec!["sqlite-db.query", "product-metadata.lookup"]);
}

#[test]
fn test_cache_entry_expires_after_ttl() {
    let clock = Arc::new(ManualClock::new());
    let cache = ResourceCache::with_clock(Duration::from_secs(5), clock.clone());

    cache.set("k", json!("v"));
    assert_eq!(cache.get_stats().cached_items, 1);
    assert_eq!(cache.get("k"), Some(json!("v")));

    clock.advance(Duration::from_secs(6));
    assert_eq!(cache.get("k"), None);

    let stats = cache.get_stats();
    assert_eq!(stats.evictions, 1);
    assert_eq!(stats.cached_items, 0);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hit_rate, "50.00%");
}
