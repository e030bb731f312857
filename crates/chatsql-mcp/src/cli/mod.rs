//! Operator CLI for chatsql-mcp
//!
//! Validates server configurations and drives the adapter from a shell:
//! inspect the aggregated catalog, probe health, call a tool, read a
//! resource or dump runtime statistics.
//!
//! ```text
//! cli/
//! ├── args.rs       # Adapter settings shared by every command
//! ├── commands/     # Command implementations
//! ├── output/       # Human and JSON formatters
//! └── error.rs      # User-friendly error display
//! ```

pub mod args;
pub mod commands;
pub mod error;
pub mod output;

use std::io::IsTerminal;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::McpResult;

/// chatsql-mcp - multi-server MCP aggregation for the chat-to-SQL backend
#[derive(Parser, Debug)]
#[command(
    name = "chatsql-mcp",
    version,
    about = "Multi-server MCP aggregation - validate, inspect, health-check and call tools",
    long_about = "Operator tool for the chat-to-SQL MCP layer.\n\
                  Validates server configurations and exercises the adapter against live servers.",
    author
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: commands::Command,

    /// Adapter settings
    #[command(flatten)]
    pub adapter: args::AdapterArgs,

    /// Enable verbose logging (-v, -vv, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "human", global = true)]
    pub format: output::OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl Cli {
    /// Execute the CLI command, returning the process exit code
    ///
    /// # Errors
    ///
    /// Returns `McpError` if settings are invalid or the command fails.
    pub async fn execute(self) -> McpResult<i32> {
        self.init_tracing();

        if self.no_color || !std::io::stdout().is_terminal() {
            colored::control::set_override(false);
        }

        let settings = self.adapter.settings()?;
        self.command.execute(settings, self.format).await
    }

    /// Install the fmt subscriber; `RUST_LOG` overrides the verbosity flags
    fn init_tracing(&self) {
        let level = if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,
                1 => Level::INFO,
                2 => Level::DEBUG,
                _ => Level::TRACE,
            }
        };

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}
