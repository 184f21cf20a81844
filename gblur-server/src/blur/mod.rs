//! Concurrent Gaussian convolution engine
//!
//! A blur job generates the kernel once, partitions the rows into one band
//! per worker, and runs the workers against a single pre-allocated output
//! buffer. Each job owns its image, kernel, and buffer exclusively.

pub mod bands;
pub mod kernel;
pub mod source;
pub mod worker;

pub use bands::{dispatch, partition, Band, BandView};
pub use kernel::KernelMatrix;
pub use source::SourceImage;

use crate::error::Result;
use image::RgbaImage;
use tracing::debug;

/// Blur `source` with `workers` concurrent workers at `radius`
pub fn blur(source: &SourceImage, workers: usize, radius: usize) -> Result<RgbaImage> {
    let kernel = KernelMatrix::generate(radius);
    let bands = partition(source.height(), workers)?;
    let output = RgbaImage::new(source.width() as u32, source.height() as u32);

    debug!(
        "Blurring {}x{} with {} workers, radius {} (kernel {}x{})",
        source.width(),
        source.height(),
        bands.len(),
        radius,
        kernel.size(),
        kernel.size()
    );

    dispatch(&bands, source, &kernel, output)
}
