//! tapeguard - Entry point
//!
//! Gates trading decisions on market data freshness and quality, and
//! journals every decision (taken or suppressed) in shadow mode.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Market data quality gate and shadow decision journal
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TAPEGUARD_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tapeguard_bot::init_logging()?;

    info!("Starting tapeguard v{}", env!("CARGO_PKG_VERSION"));

    let config = match args.config {
        Some(path) => {
            info!(config_path = %path, "Loading configuration");
            tapeguard_bot::AppConfig::from_file(&path)?
        }
        None => tapeguard_bot::AppConfig::load()?,
    };
    info!(mode = ?config.mode, journal_path = %config.journal.file_path.display(), "Configuration loaded");

    let mut app = tapeguard_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
