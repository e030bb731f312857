//! Call and read command implementations

use clap::Args;
use serde_json::Value;
use std::io;
use tracing::info;

use crate::cli::output::{OutputFormat, get_formatter};
use crate::config::AdapterSettings;
use crate::error::{McpError, McpResult};

/// Execute one tool through the adapter
///
/// # Examples
///
///   chatsql-mcp call sqlite-db.query --args '{"sql": "SELECT 1"}'
#[derive(Debug, Args)]
pub struct CallCommand {
    /// Tool name (`server.tool` in multi-server mode)
    pub tool: String,

    /// Tool arguments as a JSON object
    #[arg(short, long = "args", value_name = "JSON", default_value = "{}")]
    pub args: String,
}

impl CallCommand {
    /// Parse `--args`
    ///
    /// # Errors
    ///
    /// Returns `McpError::Configuration` unless `--args` is a JSON object.
    pub fn arguments(&self) -> McpResult<Value> {
        let value: Value = serde_json::from_str(&self.args)
            .map_err(|e| McpError::configuration_field("--args", format!("invalid JSON: {e}")))?;
        if !value.is_object() {
            return Err(McpError::configuration_field("--args", "must be a JSON object"));
        }
        Ok(value)
    }

    /// Execute the call command
    ///
    /// # Errors
    ///
    /// Returns `McpError` if the arguments are invalid, initialization fails
    /// or the tool call fails.
    pub async fn execute(self, settings: AdapterSettings, format: OutputFormat) -> McpResult<i32> {
        let arguments = self.arguments()?;
        let adapter = super::start_adapter(settings).await?;

        info!(tool = %self.tool, "Calling tool");
        let result = adapter.execute_tool(&self.tool, arguments).await;
        adapter.shutdown().await;

        get_formatter(format).write_value(&result?, &mut io::stdout().lock())?;
        Ok(0)
    }
}

/// Read one resource through the adapter
///
/// # Examples
///
///   chatsql-mcp read schema://tables
#[derive(Debug, Args)]
pub struct ReadCommand {
    /// Resource URI
    pub uri: String,
}

impl ReadCommand {
    /// Execute the read command
    ///
    /// # Errors
    ///
    /// Returns `McpError` if initialization or the read fails.
    pub async fn execute(self, settings: AdapterSettings, format: OutputFormat) -> McpResult<i32> {
        let adapter = super::start_adapter(settings).await?;
        let result = adapter.get_resource(&self.uri).await;
        adapter.shutdown().await;

        get_formatter(format).write_value(&result?, &mut io::stdout().lock())?;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(args: &str) -> CallCommand {
        CallCommand {
            tool: "sqlite-db.query".to_string(),
            args: args.to_string(),
        }
    }

    #[test]
    fn test_arguments_must_be_an_object() {
        assert!(call("{}").arguments().is_ok());
        assert!(call("[1, 2]").arguments().unwrap_err().is_configuration());
        assert!(call("{not json").arguments().unwrap_err().is_configuration());
    }
}
