use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedhook::app::AppContext;
use feedhook::config::{Cli, Config};
use feedhook::daemon::Daemon;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Variables from .env must be visible before the CLI reads the environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match Config::try_from(cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let ctx = Arc::new(AppContext::new(config)?);
    let daemon = Daemon::new(ctx);

    tokio::select! {
        result = daemon.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
