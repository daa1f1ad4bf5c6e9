//! keel CLI binary.
//!
//! This is the entry point for the `keel` command-line tool. It initializes
//! logging via `tracing`, parses arguments with `clap`, and dispatches to
//! the appropriate command handler.

mod cli;
mod commands;

use miette::Result;

use keel_core::config::GlobalConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::parse();

    let fallback = if args.verbose {
        "debug".to_string()
    } else {
        GlobalConfig::load()
            .map(|c| c.log.filter)
            .unwrap_or_else(|_| "warn".to_string())
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .init();
    tracing::debug!("keel {}", env!("CARGO_PKG_VERSION"));

    commands::dispatch(args).await
}
