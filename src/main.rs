// courtbook - venue court booking automator
// Main entry point

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use courtbook::cli::{commands, Cli};
use courtbook::config::load_config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(cli.verbose || config.features.debug_logging)?;

    commands::dispatch(cli.command, &config).await
}

/// fmt subscriber honoring RUST_LOG, with `log` records bridged in
fn init_tracing(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("courtbook=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .finish();

    tracing_log::LogTracer::init().context("Failed to bridge log records")?;
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;
    Ok(())
}
