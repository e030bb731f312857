//! Shared infrastructure for integration tests
//!
//! - `McpResponder`: a wiremock responder speaking JSON-RPC over HTTP
//! - `write_config`: configuration documents on disk

#![allow(dead_code)]

use serde_json::{Value, json};
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::{Request, Respond, ResponseTemplate};

/// Write a configuration document to a temporary file
pub fn write_config(doc: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(doc.to_string().as_bytes()).expect("write config");
    file
}

/// Configuration with SSE servers given as `(name, priority, critical)`
pub fn sse_config(servers: &[(&str, u8, bool)]) -> Value {
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
    json!({
        "version": "1.0.0",
        "defaults": {"retry_attempts": 0, "retry_delay": 1},
        "servers": servers
    })
}

/// JSON-RPC responder for a wiremock HTTP endpoint
///
/// Echoes request ids, answers `initialize`, `tools/list`, `tools/call`
/// and `ping`, and accepts notifications with 202.
#[derive(Debug, Clone, Default)]
pub struct McpResponder {
    pub tools: Vec<Value>,
    pub session_id: Option<String>,
    pub event_stream: bool,
}

impl McpResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, name: &str) -> Self {
        self.tools.push(json!({"name": name, "inputSchema": {"type": "object"}}));
        self
    }

    pub fn with_session(mut self, id: &str) -> Self {
        self.session_id = Some(id.to_string());
        self
    }

    pub fn as_event_stream(mut self) -> Self {
        self.event_stream = true;
        self
    }

    /// JSON-RPC response to one request
    pub fn reply(&self, id: &Value, method: &str, params: &Value) -> Value {
        match method {
            "initialize" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "protocolVersion": "2025-06-18",
                    "capabilities": {"tools": {}},
                    "serverInfo": {"name": "wiremock", "version": "1.0.0"}
                }
            }),
            "tools/list" => json!({"jsonrpc": "2.0", "id": id, "result": {"tools": self.tools}}),
            "tools/call" if params["name"] == "explode" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": -32602, "message": "unknown tool"}
            }),
            "tools/call" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {"content": [{"type": "text", "text": params["arguments"].to_string()}]}
            }),
            "ping" => json!({"jsonrpc": "2.0", "id": id, "result": {}}),
            other => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": -32601, "message": format!("method not found: {other}")}
            }),
        }
    }
}

impl Respond for McpResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
            return ResponseTemplate::new(400);
        };
        let Some(id) = body.get("id") else {
            return ResponseTemplate::new(202);
        };

        let method = body["method"].as_str().unwrap_or_default();
        let reply = self.reply(id, method, &body["params"]);

        let mut template = if self.event_stream {
            ResponseTemplate::new(200).set_body_raw(
                format!(": keep-alive\n\nevent: message\ndata: {reply}\n\n"),
                "text/event-stream",
            )
        } else {
            ResponseTemplate::new(200).set_body_json(reply)
        };
        if let Some(sid) = &self.session_id {
            template = template.insert_header("Mcp-Session-Id", sid.as_str());
        }
        template
    }
}
