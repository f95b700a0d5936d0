//! peakwatch - near-high market scanner
//!
//! # Usage
//! ```sh
//! peakwatch scan --asset-class crypto
//! peakwatch scan --asset-class stock --limit 20
//! peakwatch alerts --asset-class crypto
//! ```
//!
//! Configuration is read from the environment (and `.env`), see `config`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use peakwatch::application::bootstrap::{PersistenceBootstrap, ServicesBootstrap};
use peakwatch::config::Config;
use peakwatch::domain::market::AssetClass;
use std::str::FromStr;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the universe, refresh the watchlist and check price alerts
    Scan {
        /// Asset class (crypto or stock)
        #[arg(long, default_value = "crypto")]
        asset_class: String,

        /// Universe size for this run (defaults to SCAN_UNIVERSE_SIZE)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Check active price alerts without scanning
    Alerts {
        /// Asset class (crypto or stock)
        #[arg(long, default_value = "crypto")]
        asset_class: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env().context("Invalid configuration")?;
    info!("peakwatch {} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Scan { asset_class, limit } => {
            let asset_class = AssetClass::from_str(&asset_class)?;
            let persistence = PersistenceBootstrap::init(&config.database).await?;
            let pipeline = ServicesBootstrap::scan_pipeline(&config, asset_class, &persistence)?;

            let report = pipeline
                .run(limit)
                .await
                .with_context(|| format!("{} scan failed", asset_class))?;
            info!(
                "Scan complete: {} signals persisted, {} failed symbols, {} alerts sent",
                report.persisted, report.failed, report.alerts_sent
            );
        }
        Commands::Alerts { asset_class } => {
            let asset_class = AssetClass::from_str(&asset_class)?;
            let persistence = PersistenceBootstrap::init(&config.database).await?;
            let prices = ServicesBootstrap::price_source(&config, asset_class)?;
            let engine = ServicesBootstrap::alert_engine(&config, &persistence);

            let sent = engine
                .check_active(asset_class, prices.as_ref())
                .await
                .with_context(|| format!("{} alert check failed", asset_class))?;
            info!("Alert check complete: {} alerts sent", sent);
        }
    }

    Ok(())
}
