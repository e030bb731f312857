//! Health command implementation

use clap::Args;
use std::io;
use tracing::warn;

use crate::cli::output::{OutputFormat, get_formatter};
use crate::config::AdapterSettings;
use crate::error::McpResult;

/// Exit code when any server is unhealthy
pub const UNHEALTHY_EXIT_CODE: i32 = 1;

/// Print the health report; exits with status 1 when unhealthy
///
/// # Examples
///
///   chatsql-mcp health && echo "all servers up"
#[derive(Debug, Args)]
pub struct HealthCommand {}

impl HealthCommand {
    /// Execute the health command
    ///
    /// # Errors
    ///
    /// Returns `McpError` if initialization fails.
    pub async fn execute(self, settings: AdapterSettings, format: OutputFormat) -> McpResult<i32> {
        let adapter = super::start_adapter(settings).await?;
        let health = adapter.health_check().await;
        adapter.shutdown().await;

        get_formatter(format).write_health(&health, &mut io::stdout().lock())?;
        if health.healthy {
            Ok(0)
        } else {
            warn!(unhealthy = ?health.unhealthy_servers(), "Health check failed");
            Ok(UNHEALTHY_EXIT_CODE)
        }
    }
}
