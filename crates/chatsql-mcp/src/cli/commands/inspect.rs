//! Inspect command implementation

use clap::Args;
use std::io;

use crate::adapter::McpAdapter;
use crate::cli::output::{Catalog, OutputFormat, get_formatter};
use crate::config::AdapterSettings;
use crate::error::McpResult;

/// Initialize the adapter and print its catalog
///
/// # Examples
///
///   chatsql-mcp --mode MULTI_SERVER --config mcp_servers.json inspect
///   chatsql-mcp inspect -f json
#[derive(Debug, Args)]
pub struct InspectCommand {
    /// Only list tools
    #[arg(long, conflicts_with = "resources_only")]
    pub tools_only: bool,

    /// Only list resources
    #[arg(long)]
    pub resources_only: bool,
}

impl InspectCommand {
    /// Execute the inspect command
    ///
    /// # Errors
    ///
    /// Returns `McpError` if initialization or listing fails.
    pub async fn execute(self, settings: AdapterSettings, format: OutputFormat) -> McpResult<i32> {
        let adapter = super::start_adapter(settings).await?;
        let result = self.run(&adapter, format).await;
        adapter.shutdown().await;
        result
    }

    async fn run(&self, adapter: &McpAdapter, format: OutputFormat) -> McpResult<i32> {
        let tools = if self.resources_only { Vec::new() } else { adapter.list_tools().await? };
        let resources = if self.tools_only { Vec::new() } else { adapter.list_resources().await? };

        let catalog = Catalog {
            mode: adapter.get_mode(),
            tools: &tools,
            resources: &resources,
        };
        get_formatter(format).write_catalog(&catalog, &mut io::stdout().lock())?;
        Ok(0)
    }
}
