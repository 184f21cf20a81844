//! # gblur client library
//!
//! Sends one blur request and collects the reply. The reply has no length
//! prefix: it is complete when the server closes the connection, and an
//! empty reply means the server rejected or failed the request.

use gblur_common::ControlHeader;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Client-side failures
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Connection error: {0}")]
    Io(#[from] std::io::Error),

    /// Server closed the connection without sending anything
    #[error("Server closed the connection without a reply")]
    EmptyReply,

    #[error("Reply is not a decodable image: {0}")]
    InvalidReply(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Send `header` and `payload`, half-close, and read the reply to EOF
pub async fn request_blur(
    addr: SocketAddr,
    header: ControlHeader,
    payload: &[u8],
) -> Result<Vec<u8>> {
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|source| ClientError::Connect { addr, source })?;

    stream.write_all(&header.to_bytes()).await?;
    stream.write_all(payload).await?;
    // End of payload is signalled by closing our write side
    stream.shutdown().await?;
    debug!("Sent {} payload bytes to {}", payload.len(), addr);

    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).await?;
    debug!("Received {} reply bytes", reply.len());

    if reply.is_empty() {
        return Err(ClientError::EmptyReply);
    }
    Ok(reply)
}

/// Confirm the reply decodes and return its dimensions
pub fn validate_reply(reply: &[u8]) -> Result<(u32, u32)> {
    let image =
        image::load_from_memory(reply).map_err(|e| ClientError::InvalidReply(e.to_string()))?;
    Ok((image.width(), image.height()))
}
