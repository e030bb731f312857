//! Stats command implementation

use clap::Args;
use std::io;

use crate::cli::output::{OutputFormat, get_formatter};
use crate::config::AdapterSettings;
use crate::error::McpResult;

/// Initialize the adapter and print its runtime statistics
#[derive(Debug, Args)]
pub struct StatsCommand {}

impl StatsCommand {
    /// Execute the stats command
    ///
    /// # Errors
    ///
    /// Returns `McpError` if initialization fails.
    pub async fn execute(self, settings: AdapterSettings, format: OutputFormat) -> McpResult<i32> {
        let adapter = super::start_adapter(settings).await?;
        let stats = adapter.get_stats();
        adapter.shutdown().await;

        get_formatter(format).write_stats(&stats, &mut io::stdout().lock())?;
        Ok(0)
    }
}
