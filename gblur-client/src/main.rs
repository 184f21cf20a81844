//! Blur client (gblur-client)
//!
//! Sends an image file to a gblur-server and writes the blurred reply.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use gblur_client::{request_blur, validate_reply};
use gblur_common::logging::init_tracing;
use gblur_common::{ControlHeader, LoggingConfig};
use tracing::info;

/// Command-line arguments for gblur-client
#[derive(Parser, Debug)]
#[command(name = "gblur-client")]
#[command(about = "Send an image to gblur-server and save the blurred result")]
#[command(version)]
struct Args {
    /// Image file to blur
    input: PathBuf,

    /// Where to write the blurred image
    #[arg(short, long)]
    output: PathBuf,

    /// Server host
    #[arg(long, default_value = "127.0.0.1", env = "GBLUR_HOST")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "8080", env = "GBLUR_PORT")]
    port: u16,

    /// Number of concurrent workers the server should use
    #[arg(short, long, default_value = "4", allow_negative_numbers = true)]
    workers: i32,

    /// Blur radius in pixels
    #[arg(short, long, default_value = "3", allow_negative_numbers = true)]
    radius: i32,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("Failed to resolve {}:{}", host, port))?
        .next()
        .ok_or_else(|| anyhow!("No address found for {}:{}", host, port))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&LoggingConfig {
        level: args.log_level.clone(),
        file: None,
    })
    .context("Failed to initialize logging")?;

    let payload = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let addr = resolve(&args.host, args.port).await?;
    let header = ControlHeader::new(args.workers, args.radius);
    info!(
        "Requesting blur of {} ({} bytes) from {} with workers={}, radius={}",
        args.input.display(),
        payload.len(),
        addr,
        header.worker_count,
        header.radius
    );

    let reply = request_blur(addr, header, &payload)
        .await
        .context("Blur request failed")?;
    let (width, height) = validate_reply(&reply)?;

    tokio::fs::write(&args.output, &reply)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Wrote {}x{} blurred image to {}",
        width,
        height,
        args.output.display()
    );
    Ok(())
}
