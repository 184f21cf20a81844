//! Connection handler
//!
//! One request per connection:
//! header → payload → decode → blur → encode → reply → close.
//!
//! Any failure aborts the connection without writing a single byte; the
//! client sees a close with no payload and must treat that as failure.

use crate::blur;
use crate::codec::{decode_image, discard_payload, encode_image, read_payload};
use crate::error::{Error, Result};
use gblur_common::{ControlHeader, OutputFormat, TomlConfig};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Per-server settings every connection reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerSettings {
    pub output_format: OutputFormat,
    pub max_workers: i32,
    pub max_radius: i32,
}

impl HandlerSettings {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            output_format: config.output_format,
            max_workers: config.max_workers,
            max_radius: config.max_radius,
        }
    }
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self::from_config(&TomlConfig::default())
    }
}

/// Validated blur parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurJob {
    pub workers: usize,
    pub radius: usize,
}

impl BlurJob {
    /// Reject headers the scheduler cannot serve
    ///
    /// A zero or negative worker count would divide by zero when sizing
    /// bands; a negative radius has no kernel.
    pub fn from_header(header: &ControlHeader, settings: &HandlerSettings) -> Result<Self> {
        if header.worker_count < 1 {
            return Err(Error::InvalidRequest(format!(
                "worker count must be at least 1, got {}",
                header.worker_count
            )));
        }
        if header.worker_count > settings.max_workers {
            return Err(Error::InvalidRequest(format!(
                "worker count {} exceeds limit {}",
                header.worker_count, settings.max_workers
            )));
        }
        if header.radius < 0 {
            return Err(Error::InvalidRequest(format!(
                "radius must not be negative, got {}",
                header.radius
            )));
        }
        if header.radius > settings.max_radius {
            return Err(Error::InvalidRequest(format!(
                "radius {} exceeds limit {}",
                header.radius, settings.max_radius
            )));
        }

        Ok(Self {
            workers: header.worker_count as usize,
            radius: header.radius as usize,
        })
    }
}

/// What a successful request produced, for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplySummary {
    pub job: BlurJob,
    pub width: usize,
    pub height: usize,
    pub request_bytes: usize,
    pub reply_bytes: usize,
    pub elapsed: Duration,
}

/// Serve exactly one blur request on `stream`
pub async fn handle_connection<S>(mut stream: S, settings: HandlerSettings) -> Result<ReplySummary>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let started = Instant::now();

    let header = ControlHeader::read_from(&mut stream).await?;
    debug!(
        "Control header: workers={}, radius={}",
        header.worker_count, header.radius
    );
    let job = match BlurJob::from_header(&header, &settings) {
        Ok(job) => job,
        Err(e) => {
            let dropped = discard_payload(&mut stream).await?;
            debug!("Discarded {} payload bytes of rejected request", dropped);
            return Err(e);
        }
    };

    let payload = read_payload(&mut stream).await?;
    debug!("Received {} payload bytes", payload.len());
    let request_bytes = payload.len();

    let format = settings.output_format;
    let span = tracing::Span::current();
    let (reply, width, height) = tokio::task::spawn_blocking(move || {
        span.in_scope(|| run_job(&payload, job, format))
    })
    .await
    .map_err(|e| Error::Worker(format!("blur task failed: {}", e)))??;

    stream
        .write_all(&reply)
        .await
        .map_err(|e| Error::Connection(format!("failed writing reply: {}", e)))?;
    stream
        .shutdown()
        .await
        .map_err(|e| Error::Connection(format!("failed closing connection: {}", e)))?;

    Ok(ReplySummary {
        job,
        width,
        height,
        request_bytes,
        reply_bytes: reply.len(),
        elapsed: started.elapsed(),
    })
}

/// CPU-bound part of a request: decode, blur, encode
fn run_job(payload: &[u8], job: BlurJob, format: OutputFormat) -> Result<(Vec<u8>, usize, usize)> {
    let source = decode_image(payload)?;
    debug!("Decoded {}x{} image", source.width(), source.height());

    let blurred = blur::blur(&source, job.workers, job.radius)?;
    let reply = encode_image(&blurred, format)?;
    debug!("Encoded {} reply bytes as {}", reply.len(), format);

    Ok((reply, source.width(), source.height()))
}
