//! Validate command implementation

use clap::Args;
use std::io;
use tracing::info;

use crate::cli::output::{OutputFormat, get_formatter};
use crate::config::{AdapterSettings, Configuration};
use crate::error::McpResult;

/// Load and validate the server configuration file
///
/// No server is contacted.
///
/// # Examples
///
///   chatsql-mcp --config mcp_servers.json validate
#[derive(Debug, Args)]
pub struct ValidateCommand {}

impl ValidateCommand {
    /// Execute the validate command
    ///
    /// # Errors
    ///
    /// Returns `McpError::Configuration` or `McpError::Io` when the file is
    /// missing or invalid.
    pub fn execute(self, settings: &AdapterSettings, format: OutputFormat) -> McpResult<i32> {
        let config = Configuration::load(&settings.config_path)?;
        info!(
            path = %settings.config_path.display(),
            servers = config.servers.len(),
            "Configuration valid"
        );

        get_formatter(format).write_configuration(&config, &mut io::stdout().lock())?;
        Ok(0)
    }
}
