//! Blur server (gblur-server) - Main entry point
//!
//! Listens on TCP, reads a control header and an encoded image per
//! connection, and replies with the Gaussian-blurred image.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gblur_common::logging::init_tracing;
use gblur_common::{OutputFormat, TomlConfig};
use gblur_server::BlurServer;
use tokio::signal;
use tracing::{error, info};

/// Command-line arguments for gblur-server
#[derive(Parser, Debug)]
#[command(name = "gblur-server")]
#[command(about = "Concurrent Gaussian blur service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "GBLUR_CONFIG")]
    config: Option<PathBuf>,

    /// Interface to bind
    #[arg(long, env = "GBLUR_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "GBLUR_PORT")]
    port: Option<u16>,

    /// Reply image format (png, bmp, tiff, jpeg)
    #[arg(short = 'f', long)]
    output_format: Option<OutputFormat>,

    /// Log level when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Overlay command-line and environment values onto the TOML config
    fn apply(self, mut config: TomlConfig) -> TomlConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(format) = self.output_format {
            config.output_format = format;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let config = args.apply(config);

    init_tracing(&config.logging).context("Failed to initialize logging")?;

    info!(
        "Starting gblur-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!(
        "Output format: {}, max workers: {}, max radius: {}",
        config.output_format, config.max_workers, config.max_radius
    );

    let server = BlurServer::bind(&config)
        .await
        .context("Failed to start server")?;

    server
        .run_until(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
