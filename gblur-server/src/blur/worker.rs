//! Convolution worker
//!
//! Computes the weighted blur for every pixel of one band. Reads may touch
//! any row of the source image; writes stay inside the band's own view.
//!
//! Neighbours outside the image are replaced by the nearest in-bounds pixel,
//! each axis clamped independently (edge replication).

use super::bands::BandView;
use super::kernel::KernelMatrix;
use super::source::SourceImage;

/// Source channels arrive 16-bit scaled; dividing by this narrows to 8 bits
pub const CHANNEL_SCALE: f64 = 256.0;

/// Output alpha, regardless of source alpha
pub const OPAQUE: u8 = 255;

/// Clamp a possibly out-of-range coordinate into `[0, len - 1]`
///
/// `len` must be non-zero.
#[inline]
pub fn clamp_index(i: isize, len: usize) -> usize {
    if i < 0 {
        0
    } else {
        (i as usize).min(len - 1)
    }
}

/// Narrow an accumulated channel to 8 bits
///
/// Truncates toward zero, then keeps the low byte. Values above 255 wrap
/// instead of saturating.
#[inline]
pub fn narrow_channel(value: f64) -> u8 {
    value as i64 as u8
}

/// Blur every pixel in `view`'s band
pub fn convolve_band(source: &SourceImage, kernel: &KernelMatrix, mut view: BandView<'_>) {
    let band = view.band();
    let width = source.width();
    let height = source.height();
    if band.is_empty() || width == 0 {
        return;
    }

    let r = kernel.radius() as isize;
    let divisor = kernel.sum() * CHANNEL_SCALE;

    for y in band.y_start..band.y_end {
        for x in 0..width {
            let mut acc = [0.0f64; 3];

            for i in -r..=r {
                let px = clamp_index(x as isize + i, width);
                let ki = (i + r) as usize;
                for j in -r..=r {
                    let py = clamp_index(y as isize + j, height);
                    let weight = kernel.weight(ki, (j + r) as usize);
                    let [cr, cg, cb] = source.color(px, py);
                    acc[0] += cr as f64 * weight;
                    acc[1] += cg as f64 * weight;
                    acc[2] += cb as f64 * weight;
                }
            }

            view.put_pixel(
                x,
                y,
                [
                    narrow_channel(acc[0] / divisor),
                    narrow_channel(acc[1] / divisor),
                    narrow_channel(acc[2] / divisor),
                    OPAQUE,
                ],
            );
        }
    }
}
