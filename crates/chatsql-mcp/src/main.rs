//! chatsql-mcp CLI entry point

#![warn(clippy::all)]

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("Error: CLI feature not enabled. Build with --features cli");
    std::process::exit(1);
}

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() {
    use clap::Parser;

    let cli = chatsql_mcp::cli::Cli::parse();

    match cli.execute().await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            let exit_code = chatsql_mcp::cli::error::display_error(&e);
            std::process::exit(exit_code);
        }
    }
}
