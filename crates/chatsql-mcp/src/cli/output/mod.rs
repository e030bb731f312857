//! Output formatters
//!
//! Every command writes its result through an [`OutputFormatter`], so the
//! same command prints colored text for operators or JSON for scripts.

pub mod human;
pub mod json;

use clap::ValueEnum;
use serde_json::Value;
use std::io::Write;

use crate::adapter::RuntimeStats;
use crate::aggregator::{NamespacedResource, NamespacedTool};
use crate::config::{AdapterMode, Configuration};
use crate::error::McpResult;
use crate::health::HealthStatus;

/// Output format for CLI results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output (default)
    Human,
    /// JSON format (for scripting)
    Json,
    /// JSON with pretty-printing
    JsonPretty,
}

/// Aggregated catalog as seen through the adapter
#[derive(Debug, serde::Serialize)]
pub struct Catalog<'a> {
    /// Mode the adapter settled in
    pub mode: AdapterMode,
    /// Tools, namespaced in multi-server mode
    pub tools: &'a [NamespacedTool],
    /// Resources with their owning server
    pub resources: &'a [NamespacedResource],
}

/// Formats command results
pub trait OutputFormatter {
    /// Write a validated configuration
    ///
    /// # Errors
    ///
    /// Returns `McpError` if writing to the output fails.
    fn write_configuration(&self, config: &Configuration, writer: &mut dyn Write) -> McpResult<()>;

    /// Write the tool and resource catalog
    ///
    /// # Errors
    ///
    /// Returns `McpError` if writing to the output fails.
    fn write_catalog(&self, catalog: &Catalog<'_>, writer: &mut dyn Write) -> McpResult<()>;

    /// Write a health report
    ///
    /// # Errors
    ///
    /// Returns `McpError` if writing to the output fails.
    fn write_health(&self, health: &HealthStatus, writer: &mut dyn Write) -> McpResult<()>;

    /// Write runtime statistics
    ///
    /// # Errors
    ///
    /// Returns `McpError` if writing to the output fails.
    fn write_stats(&self, stats: &RuntimeStats, writer: &mut dyn Write) -> McpResult<()>;

    /// Write a raw tool or resource result
    ///
    /// # Errors
    ///
    /// Returns `McpError` if writing to the output fails.
    fn write_value(&self, value: &Value, writer: &mut dyn Write) -> McpResult<()>;
}

/// Create the formatter for `format`
#[must_use]
pub fn get_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Human => Box::new(human::HumanFormatter::new()),
        OutputFormat::Json => Box::new(json::JsonFormatter::new(false)),
        OutputFormat::JsonPretty => Box::new(json::JsonFormatter::new(true)),
    }
}
