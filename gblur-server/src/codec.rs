//! Image payload codec
//!
//! Thin adapter over the `image` crate. The request payload carries no
//! length prefix, so it is read until the client half-closes its write side
//! and then handed to the format sniffer.

use crate::blur::SourceImage;
use crate::error::{Error, Result};
use gblur_common::OutputFormat;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Map the configured output format to the codec's format enum
pub fn image_format(format: OutputFormat) -> ImageFormat {
    match format {
        OutputFormat::Png => ImageFormat::Png,
        OutputFormat::Bmp => ImageFormat::Bmp,
        OutputFormat::Tiff => ImageFormat::Tiff,
        OutputFormat::Jpeg => ImageFormat::Jpeg,
    }
}

/// Read the remaining request bytes up to end-of-stream
pub async fn read_payload<R>(reader: &mut R) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut payload = Vec::new();
    reader
        .read_to_end(&mut payload)
        .await
        .map_err(|e| Error::Connection(format!("failed reading image payload: {}", e)))?;
    Ok(payload)
}

/// Consume and drop the remaining request bytes
///
/// A socket closed with unread data is reset instead of closed.
pub async fn discard_payload<R>(reader: &mut R) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    tokio::io::copy(reader, &mut tokio::io::sink())
        .await
        .map_err(|e| Error::Connection(format!("failed draining image payload: {}", e)))
}

/// Decode a self-describing image container
pub fn decode_image(bytes: &[u8]) -> Result<SourceImage> {
    if bytes.is_empty() {
        return Err(Error::Decode("empty image payload".to_string()));
    }
    let image = image::load_from_memory(bytes).map_err(|e| Error::Decode(e.to_string()))?;
    Ok(SourceImage::from_dynamic(&image))
}

/// Serialize the blurred buffer in `format`
pub fn encode_image(buffer: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);

    let result = match format {
        // JPEG has no alpha channel; output alpha is always opaque anyway
        OutputFormat::Jpeg => DynamicImage::ImageRgba8(buffer.clone())
            .to_rgb8()
            .write_to(&mut cursor, ImageFormat::Jpeg),
        other => buffer.write_to(&mut cursor, image_format(other)),
    };
    result.map_err(|e| Error::Encode(e.to_string()))?;

    Ok(bytes)
}
