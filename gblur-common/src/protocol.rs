//! Control header codec
//!
//! Every request starts with a fixed 8-byte header:
//!
//! | offset | size | field        | encoding               |
//! |--------|------|--------------|------------------------|
//! | 0      | 4    | worker count | signed 32-bit, big-endian |
//! | 4      | 4    | blur radius  | signed 32-bit, big-endian |
//!
//! The encoded image follows immediately with no length prefix. The reply is
//! the re-encoded image, terminated only by the server closing the socket.

use crate::{Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the control header on the wire
pub const HEADER_LEN: usize = 8;

/// Parameters sent ahead of the image payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlHeader {
    /// Number of concurrent convolution workers requested
    pub worker_count: i32,
    /// Gaussian blur radius in pixels
    pub radius: i32,
}

impl ControlHeader {
    pub fn new(worker_count: i32, radius: i32) -> Self {
        Self {
            worker_count,
            radius,
        }
    }

    /// Serialize to the wire layout, worker count first
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(&self.worker_count.to_be_bytes());
        out[4..].copy_from_slice(&self.radius.to_be_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; HEADER_LEN]) -> Self {
        let worker_count = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let radius = i32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Self {
            worker_count,
            radius,
        }
    }

    /// Read exactly one header from the stream
    ///
    /// Fails with [`Error::Protocol`] if the stream ends before 8 bytes
    /// have arrived.
    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; HEADER_LEN];
        match reader.read_exact(&mut buf).await {
            Ok(_) => Ok(Self::from_bytes(&buf)),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(Error::Protocol(
                format!("stream ended before {} header bytes were available", HEADER_LEN),
            )),
            Err(e) => Err(Error::Io(e)),
        }
    }

    pub async fn write_to<W>(&self, writer: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.to_bytes()).await?;
        Ok(())
    }
}
