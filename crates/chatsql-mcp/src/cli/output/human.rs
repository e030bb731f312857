//! Human-readable colored output formatter

use colored::Colorize;
use serde_json::Value;
use std::io::Write;

use super::{Catalog, OutputFormatter};
use crate::adapter::RuntimeStats;
use crate::config::Configuration;
use crate::error::McpResult;
use crate::health::HealthStatus;

/// Colored terminal output; coloring follows `colored`'s global override
#[derive(Debug, Default)]
pub struct HumanFormatter;

impl HumanFormatter {
    /// Create a new human formatter
    pub fn new() -> Self {
        Self
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}", title.bold().cyan(), "─".repeat(title.chars().count()))
    }

    fn kv(key: &str, value: &str) -> String {
        format!("  {}: {}", key.bold(), value)
    }

    fn status(healthy: bool) -> String {
        if healthy {
            "✓ healthy".green().to_string()
        } else {
            "✗ unhealthy".red().to_string()
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn write_configuration(&self, config: &Configuration, writer: &mut dyn Write) -> McpResult<()> {
        writeln!(writer, "{} Configuration is valid", "✓".green().bold())?;
        writeln!(writer, "{}", Self::kv("Version", &config.version))?;
        if let Some(description) = config.metadata.as_ref().and_then(|m| m.description.as_ref()) {
            writeln!(writer, "{}", Self::kv("Description", description))?;
        }
        writeln!(
            writer,
            "{}",
            Self::kv(
                "Defaults",
                &format!(
                    "timeout {}ms, {} retries every {}ms",
                    config.defaults.timeout, config.defaults.retry_attempts, config.defaults.retry_delay
                )
            )
        )?;

        let enabled = config.enabled_servers_by_priority();
        writeln!(writer, "{}", Self::section_header(&format!("Enabled servers ({})", enabled.len())))?;
        for server in enabled {
            let critical = if server.critical { " critical".red().to_string() } else { String::new() };
            writeln!(
                writer,
                "  • {} [{}] priority {}{}",
                server.name.bold(),
                server.transport(),
                server.priority,
                critical
            )?;
            if let Some(description) = &server.description {
                writeln!(writer, "    {}", description.dimmed())?;
            }
        }

        let disabled: Vec<_> = config.servers.iter().filter(|s| !s.enabled).collect();
        if !disabled.is_empty() {
            writeln!(writer, "{}", Self::section_header(&format!("Disabled servers ({})", disabled.len())))?;
            for server in disabled {
                writeln!(writer, "  • {}", server.name.dimmed())?;
            }
        }
        Ok(())
    }

    fn write_catalog(&self, catalog: &Catalog<'_>, writer: &mut dyn Write) -> McpResult<()> {
        writeln!(writer, "{}", Self::kv("Mode", catalog.mode.as_str()))?;

        writeln!(writer, "{}", Self::section_header(&format!("Tools ({})", catalog.tools.len())))?;
        for tool in catalog.tools {
            writeln!(writer, "  • {}", tool.name.bold())?;
            if let Some(description) = &tool.description {
                writeln!(writer, "    {}", description.dimmed())?;
            }
        }

        writeln!(
            writer,
            "{}",
            Self::section_header(&format!("Resources ({})", catalog.resources.len()))
        )?;
        for resource in catalog.resources {
            writeln!(writer, "  • {} {}", resource.uri.bold(), format!("({})", resource.server).dimmed())?;
            if let Some(description) = &resource.description {
                writeln!(writer, "    {}", description.dimmed())?;
            }
        }
        Ok(())
    }

    fn write_health(&self, health: &HealthStatus, writer: &mut dyn Write) -> McpResult<()> {
        writeln!(writer, "{} ({})", Self::status(health.healthy), health.mode)?;
        writeln!(writer, "{}", Self::kv("Checked at", &health.checked_at.to_rfc3339()))?;

        if !health.servers.is_empty() {
            writeln!(writer, "{}", Self::section_header("Servers"))?;
            for (name, server) in &health.servers {
                let latency = server
                    .latency_ms
                    .map(|ms| format!(" {ms}ms"))
                    .unwrap_or_default();
                writeln!(
                    writer,
                    "  • {} [{}] {}{}",
                    name.bold(),
                    server.transport,
                    Self::status(server.healthy),
                    latency.dimmed()
                )?;
            }
        }

        if !health.errors.is_empty() {
            writeln!(writer, "{}", Self::section_header("Errors"))?;
            for error in &health.errors {
                writeln!(writer, "  {}", error.red())?;
            }
        }
        Ok(())
    }

    fn write_stats(&self, stats: &RuntimeStats, writer: &mut dyn Write) -> McpResult<()> {
        let mode = stats.mode.map_or("UNINITIALIZED", |m| m.as_str());
        writeln!(writer, "{}", Self::section_header("Runtime statistics"))?;
        writeln!(writer, "{}", Self::kv("Mode", mode))?;
        writeln!(writer, "{}", Self::kv("Active servers", &stats.active_servers.to_string()))?;
        writeln!(writer, "{}", Self::kv("Tools", &stats.total_tools.to_string()))?;
        writeln!(writer, "{}", Self::kv("Resources", &stats.total_resources.to_string()))?;
        writeln!(writer, "{}", Self::kv("Requests", &stats.total_requests.to_string()))?;
        writeln!(writer, "{}", Self::kv("Errors", &stats.error_count.to_string()))?;
        writeln!(
            writer,
            "{}",
            Self::kv("Cache hit ratio", &format!("{:.2}%", stats.cache_hit_ratio * 100.0))
        )?;
        writeln!(
            writer,
            "{}",
            Self::kv("Average latency", &format!("{:.2}ms", stats.average_latency))
        )?;

        if let Some(cache) = &stats.cache {
            writeln!(writer, "{}", Self::section_header("Resource cache"))?;
            writeln!(writer, "{}", Self::kv("Cached items", &cache.cached_items.to_string()))?;
            writeln!(writer, "{}", Self::kv("Hit rate", &cache.hit_rate))?;
            writeln!(
                writer,
                "{}",
                Self::kv(
                    "Hits / misses / evictions",
                    &format!("{} / {} / {}", cache.hits, cache.misses, cache.evictions)
                )
            )?;
        }
        Ok(())
    }

    fn write_value(&self, value: &Value, writer: &mut dyn Write) -> McpResult<()> {
        writeln!(writer, "{}", serde_json::to_string_pretty(value)?)?;
        Ok(())
    }
}
