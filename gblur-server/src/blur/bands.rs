//! Band scheduler
//!
//! Splits the image rows into one contiguous band per worker, hands each
//! worker an exclusive `&mut` view of its own rows of the output buffer, and
//! blocks until every worker has finished.
//!
//! Disjointness comes from construction: the output is carved with
//! `split_at_mut` along band boundaries, so no two views can alias and no
//! lock is needed. The shared source image and kernel are only read.

use super::kernel::KernelMatrix;
use super::source::SourceImage;
use super::worker::convolve_band;
use crate::error::{Error, Result};
use image::RgbaImage;
use std::any::Any;
use std::thread;
use tracing::{debug, error};

/// Bytes per output pixel (RGBA8)
pub const BYTES_PER_PIXEL: usize = 4;

/// Half-open row range `[y_start, y_end)` owned by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub y_start: usize,
    pub y_end: usize,
}

impl Band {
    pub fn height(&self) -> usize {
        self.y_end - self.y_start
    }

    pub fn is_empty(&self) -> bool {
        self.y_start == self.y_end
    }
}

/// Partition `[0, height)` into `workers` contiguous bands
///
/// Every band is `height / workers` rows tall except the last, which
/// absorbs the remainder. When `workers > height` the leading bands are
/// empty and the last one covers the whole image.
pub fn partition(height: usize, workers: usize) -> Result<Vec<Band>> {
    if workers == 0 {
        return Err(Error::InvalidRequest(
            "worker count must be at least 1".to_string(),
        ));
    }

    let band_height = height / workers;
    let bands = (0..workers)
        .map(|i| {
            let y_start = i * band_height;
            let y_end = if i == workers - 1 {
                height
            } else {
                y_start + band_height
            };
            Band { y_start, y_end }
        })
        .collect();

    Ok(bands)
}

/// Exclusive view over the output rows of one band
#[derive(Debug)]
pub struct BandView<'a> {
    band: Band,
    width: usize,
    rows: &'a mut [u8],
}

impl<'a> BandView<'a> {
    pub fn band(&self) -> Band {
        self.band
    }

    /// Write one RGBA pixel; `y` is an absolute image row inside the band
    #[inline]
    pub fn put_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        debug_assert!(y >= self.band.y_start && y < self.band.y_end);
        let offset = ((y - self.band.y_start) * self.width + x) * BYTES_PER_PIXEL;
        self.rows[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&rgba);
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.rows
    }
}

/// Carve `buffer` into one mutable view per band
///
/// Fails if the bands are not sorted, contiguous, and exactly covering the
/// buffer's rows.
pub fn split_rows<'a>(
    buffer: &'a mut [u8],
    width: usize,
    bands: &[Band],
) -> Result<Vec<BandView<'a>>> {
    let row_len = width * BYTES_PER_PIXEL;
    let mut rest = buffer;
    let mut cursor = 0;
    let mut views = Vec::with_capacity(bands.len());

    for band in bands {
        if band.y_start != cursor || band.y_end < band.y_start {
            return Err(Error::Internal(format!(
                "band {}..{} does not continue from row {}",
                band.y_start, band.y_end, cursor
            )));
        }
        let len = band.height() * row_len;
        if len > rest.len() {
            return Err(Error::Internal(format!(
                "band {}..{} extends past the output buffer",
                band.y_start, band.y_end
            )));
        }

        let (rows, tail) = std::mem::take(&mut rest).split_at_mut(len);
        rest = tail;
        cursor = band.y_end;
        views.push(BandView {
            band: *band,
            width,
            rows,
        });
    }

    if !rest.is_empty() {
        return Err(Error::Internal(format!(
            "bands end at row {} but the output has more rows",
            cursor
        )));
    }

    Ok(views)
}

/// Run one worker thread per band and wait for all of them
///
/// Returns the filled buffer only once every worker has completed. A worker
/// panic fails the whole job; no partial output escapes.
pub fn dispatch(
    bands: &[Band],
    source: &SourceImage,
    kernel: &KernelMatrix,
    mut output: RgbaImage,
) -> Result<RgbaImage> {
    let width = output.width() as usize;
    let views = split_rows(&mut output, width, bands)?;

    thread::scope(|scope| -> Result<()> {
        let mut handles = Vec::with_capacity(views.len());
        for (worker_id, view) in views.into_iter().enumerate() {
            let handle = thread::Builder::new()
                .name(format!("blur-worker-{}", worker_id))
                .spawn_scoped(scope, move || {
                    let band = view.band();
                    convolve_band(source, kernel, view);
                    debug!(
                        "Worker {} finished rows {}..{}",
                        worker_id, band.y_start, band.y_end
                    );
                })
                .map_err(|e| Error::Worker(format!("failed to spawn worker {}: {}", worker_id, e)))?;
            handles.push(handle);
        }

        // Barrier: every handle is joined before the buffer is released
        let mut faults = Vec::new();
        for (worker_id, handle) in handles.into_iter().enumerate() {
            if let Err(payload) = handle.join() {
                let message = panic_message(payload.as_ref());
                error!("Worker {} panicked: {}", worker_id, message);
                faults.push(format!("worker {}: {}", worker_id, message));
            }
        }

        if faults.is_empty() {
            Ok(())
        } else {
            Err(Error::Worker(faults.join("; ")))
        }
    })?;

    Ok(output)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact_cover(bands: &[Band], height: usize) {
        assert_eq!(bands.first().map(|b| b.y_start), Some(0));
        assert_eq!(bands.last().map(|b| b.y_end), Some(height));
        for pair in bands.windows(2) {
            assert_eq!(pair[0].y_end, pair[1].y_start);
        }
        let total: usize = bands.iter().map(Band::height).sum();
        assert_eq!(total, height);
    }

    #[test]
    fn test_partition_uneven_last_band_absorbs_remainder() {
        let bands = partition(100, 3).unwrap();
        assert_eq!(
            bands,
            vec![
                Band { y_start: 0, y_end: 33 },
                Band { y_start: 33, y_end: 66 },
                Band { y_start: 66, y_end: 100 },
            ]
        );
    }

    #[test]
    fn test_partition_exact_cover_many_shapes() {
        for height in [0, 1, 2, 7, 64, 99, 100, 1080] {
            for workers in 1..=17 {
                let bands = partition(height, workers).unwrap();
                assert_eq!(bands.len(), workers);
                assert_exact_cover(&bands, height);
            }
        }
    }

    #[test]
    fn test_more_workers_than_rows() {
        let bands = partition(3, 5).unwrap();
        assert!(bands[..4].iter().all(Band::is_empty));
        assert_eq!(bands[4], Band { y_start: 0, y_end: 3 });
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(partition(10, 0), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_split_rows_views_are_disjoint_rows() {
        let width = 2;
        let mut buffer = vec![0u8; width * 5 * BYTES_PER_PIXEL];
        let bands = partition(5, 2).unwrap();
        let mut views = split_rows(&mut buffer, width, &bands).unwrap();

        assert_eq!(views[0].as_bytes().len(), 2 * width * BYTES_PER_PIXEL);
        assert_eq!(views[1].as_bytes().len(), 3 * width * BYTES_PER_PIXEL);

        views[1].put_pixel(1, 2, [1, 2, 3, 4]);
        drop(views);
        let offset = (2 * width + 1) * BYTES_PER_PIXEL;
        assert_eq!(&buffer[offset..offset + 4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_split_rows_rejects_gap() {
        let mut buffer = vec![0u8; 4 * BYTES_PER_PIXEL * 4];
        let bands = [Band { y_start: 0, y_end: 1 }, Band { y_start: 2, y_end: 4 }];
        assert!(matches!(
            split_rows(&mut buffer, 4, &bands),
            Err(Error::Internal(_))
        ));
    }

    #[test]
    fn test_split_rows_rejects_short_cover() {
        let mut buffer = vec![0u8; 4 * BYTES_PER_PIXEL * 4];
        let bands = [Band { y_start: 0, y_end: 3 }];
        assert!(matches!(
            split_rows(&mut buffer, 4, &bands),
            Err(Error::Internal(_))
        ));
    }
}
