//! User-friendly error formatting for the CLI

use colored::Colorize;

use crate::error::McpError;

fn with_suggestion(title: &str, detail: &str, suggestion: &str) -> String {
    format!(
        "{} {}\n  {}\n\n{}\n  {}",
        "✗".red().bold(),
        title,
        detail,
        "Suggestion:".yellow(),
        suggestion
    )
}

/// Format an error for CLI display
#[must_use]
pub fn format_error(error: &McpError) -> String {
    match error {
        McpError::Configuration { message, .. } => with_suggestion(
            "Configuration error",
            message,
            "Run `chatsql-mcp validate` to check the configuration file",
        ),
        McpError::Connection { message, .. } => with_suggestion(
            "Connection error",
            message,
            "Check that the server is running and its endpoint or command is correct",
        ),
        McpError::Initialization { message, source } => with_suggestion(
            "Initialization error",
            &format!("{message}: {source}"),
            "Fix the failing server, or drop --no-fallback to allow single-server mode",
        ),
        McpError::InvalidToolName { .. } | McpError::UnknownServer { .. } => with_suggestion(
            "Unknown tool",
            &error.to_string(),
            "Run `chatsql-mcp inspect` to list the available tool names",
        ),
        McpError::ResourceNotFound { uri } => with_suggestion(
            "Unknown resource",
            uri,
            "Run `chatsql-mcp inspect --resources-only` to list the available resources",
        ),
        McpError::Timeout { .. } => with_suggestion(
            "Timeout",
            &error.to_string(),
            "Raise the server's `timeout` or `defaults.timeout` in the configuration",
        ),
        McpError::Io(err) => with_suggestion(
            "I/O error",
            &err.to_string(),
            "Check that the configuration path exists and is readable",
        ),
        _ => format!("{} {}", "✗".red().bold(), error),
    }
}

/// Display an error to stderr and return exit code
#[must_use]
pub fn display_error(error: &McpError) -> i32 {
    eprintln!("{}", format_error(error));
    2
}
