//! JSON output formatter

use serde::Serialize;
use serde_json::Value;
use std::io::Write;

use super::{Catalog, OutputFormatter};
use crate::adapter::RuntimeStats;
use crate::config::Configuration;
use crate::error::McpResult;
use crate::health::HealthStatus;

/// JSON formatter (compact or pretty)
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    #[must_use]
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn write_json<T: Serialize + ?Sized>(&self, value: &T, writer: &mut dyn Write) -> McpResult<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        writeln!(writer, "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn write_configuration(&self, config: &Configuration, writer: &mut dyn Write) -> McpResult<()> {
        self.write_json(config, writer)
    }

    fn write_catalog(&self, catalog: &Catalog<'_>, writer: &mut dyn Write) -> McpResult<()> {
        self.write_json(catalog, writer)
    }

    fn write_health(&self, health: &HealthStatus, writer: &mut dyn Write) -> McpResult<()> {
        self.write_json(health, writer)
    }

    fn write_stats(&self, stats: &RuntimeStats, writer: &mut dyn Write) -> McpResult<()> {
        self.write_json(stats, writer)
    }

    fn write_value(&self, value: &Value, writer: &mut dyn Write) -> McpResult<()> {
        self.write_json(value, writer)
    }
}
