//! Adapter settings shared by every command

use clap::Args;
use std::path::PathBuf;

use crate::config::{AdapterMode, AdapterSettings};
use crate::error::McpResult;

/// Flags mapping onto [`AdapterSettings`]
///
/// Anything not given here falls back to the `MCP_*` environment variables
/// and then to the built-in defaults.
#[derive(Debug, Clone, Args)]
pub struct AdapterArgs {
    /// Operating mode: AUTO, SINGLE_SERVER or MULTI_SERVER
    #[arg(long, env = "MCP_MODE", global = true)]
    pub mode: Option<AdapterMode>,

    /// Server configuration file
    #[arg(short, long, value_name = "PATH", env = "MCP_CONFIG_PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Fail instead of falling back to single-server mode
    #[arg(long, global = true)]
    pub no_fallback: bool,

    /// SSE endpoint of the legacy single server
    #[arg(long, value_name = "URL", env = "MCP_SERVER_URL", global = true)]
    pub legacy_url: Option<String>,
}

impl AdapterArgs {
    /// Resolve the adapter settings
    ///
    /// # Errors
    ///
    /// Returns `McpError::Configuration` when an environment variable or the
    /// legacy URL is invalid.
    pub fn settings(&self) -> McpResult<AdapterSettings> {
        let mut settings = AdapterSettings::from_env()?;
        self.apply(&mut settings)?;
        Ok(settings)
    }

    fn apply(&self, settings: &mut AdapterSettings) -> McpResult<()> {
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if let Some(path) = &self.config {
            settings.config_path.clone_from(path);
        }
        if self.no_fallback {
            settings.fallback_enabled = false;
        }
        if let Some(url) = &self.legacy_url {
            let updated = std::mem::take(settings).with_legacy_endpoint(url.clone());
            if let Some(legacy) = &updated.legacy_server {
                legacy.validate("--legacy-url")?;
            }
            *settings = updated;
        }
        Ok(())
    }
}
