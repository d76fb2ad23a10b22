//! Upload Monitor - AirDC++ upload notifications over Telegram
//!
//! Entry point: loads configuration from the environment, sets up logging
//! and runs the poll loop until Ctrl-C.

#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use upload_monitor::config::{Config, LogFormat};
use upload_monitor::{endpoints, AirDcClient, Monitor, TelegramNotifier};

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration errors are the only expected way out
    let config = Config::from_env().context("Invalid configuration")?;

    init_logging(config.monitoring.debug, config.monitoring.log_format)?;

    info!("🚀 Starting AirDC++ upload monitor");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("📋 Source: {}", config.source.base_url());
    info!(
        "⏱️ Poll every {}s, back off {}s, cleanup after {}s",
        config.polling.poll_interval_secs,
        config.polling.backoff_interval_secs,
        config.polling.cleanup_interval_secs
    );

    if let Some(port) = config.monitoring.metrics_port {
        info!("📊 Starting metrics server on port {}", port);
        tokio::spawn(async move {
            if let Err(e) = endpoints::endpoint_server(port).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    let source = AirDcClient::new(&config.source).context("Failed to build AirDC++ client")?;
    let notifier =
        TelegramNotifier::new(&config.telegram).context("Failed to build Telegram client")?;

    let monitor = Monitor::new(source, notifier, config.polling.clone());
    monitor
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool, format: LogFormat) -> Result<()> {
    let env_filter = if verbose {
        "upload_monitor=debug,info"
    } else {
        "upload_monitor=info,warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| env_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?,
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?,
    }

    Ok(())
}
