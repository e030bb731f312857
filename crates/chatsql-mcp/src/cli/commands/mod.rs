//! CLI command implementations
//!
//! Every command except `validate` initializes an adapter, runs, and shuts
//! the adapter down again before returning, including on failure.

pub mod call;
pub mod health;
pub mod inspect;
pub mod stats;
pub mod validate;

use clap::Subcommand;
use tracing::debug;

use crate::adapter::McpAdapter;
use crate::cli::output::OutputFormat;
use crate::config::AdapterSettings;
use crate::error::McpResult;

/// All available CLI commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate the server configuration file without connecting
    #[command(visible_alias = "v")]
    Validate(validate::ValidateCommand),

    /// Initialize the adapter and list its tools and resources
    #[command(visible_alias = "i")]
    Inspect(inspect::InspectCommand),

    /// Check the health of every server
    Health(health::HealthCommand),

    /// Execute one tool
    Call(call::CallCommand),

    /// Read one resource
    Read(call::ReadCommand),

    /// Print runtime statistics after initialization
    Stats(stats::StatsCommand),
}

impl Command {
    /// Execute the command, returning the process exit code
    ///
    /// # Errors
    ///
    /// Returns `McpError` if the command fails.
    pub async fn execute(self, settings: AdapterSettings, format: OutputFormat) -> McpResult<i32> {
        match self {
            Command::Validate(cmd) => cmd.execute(&settings, format),
            Command::Inspect(cmd) => cmd.execute(settings, format).await,
            Command::Health(cmd) => cmd.execute(settings, format).await,
            Command::Call(cmd) => cmd.execute(settings, format).await,
            Command::Read(cmd) => cmd.execute(settings, format).await,
            Command::Stats(cmd) => cmd.execute(settings, format).await,
        }
    }
}

/// Build and initialize an adapter
pub(crate) async fn start_adapter(settings: AdapterSettings) -> McpResult<McpAdapter> {
    debug!(mode = %settings.mode, config = %settings.config_path.display(), "Starting adapter");
    let adapter = McpAdapter::new(settings);
    adapter.initialize().await?;
    Ok(adapter)
}
