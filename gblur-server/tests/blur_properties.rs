//! Property tests for the convolution engine
//!
//! Covers:
//! - Radius 0 is an identity transform (alpha forced opaque)
//! - Flat-field invariance at any radius and worker count
//! - 1x1 images collapse every clamped neighbour to the only pixel
//! - Worker count never changes the result
//! - Radius 1 kernel pinned to its Gaussian weights; differs from a 3x3 box

use gblur_server::blur::{blur, partition, KernelMatrix, SourceImage};
use image::{DynamicImage, Rgba, RgbaImage};

// ============================================================================
// Test Helpers
// ============================================================================

fn source_from(img: RgbaImage) -> SourceImage {
    SourceImage::from_dynamic(&DynamicImage::ImageRgba8(img))
}

/// Deterministic pseudo-random image (xorshift)
fn noise_image(width: u32, height: u32, seed: u32) -> RgbaImage {
    let mut state = seed.max(1);
    RgbaImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        Rgba([r, g, b, 255])
    })
}

// ============================================================================
// Identity and invariance
// ============================================================================

#[test]
fn test_radius_zero_is_identity() {
    let input = noise_image(17, 11, 42);
    for workers in [1, 3, 11, 20] {
        let output = blur(&source_from(input.clone()), workers, 0).unwrap();
        assert_eq!(output, input, "workers {}", workers);
    }
}

#[test]
fn test_radius_zero_forces_alpha_opaque() {
    let input = RgbaImage::from_fn(4, 4, |x, y| Rgba([50, 60, 70, (x * 60 + y) as u8]));
    let output = blur(&source_from(input), 2, 0).unwrap();
    assert!(output.pixels().all(|p| p.0[3] == 255));
}

#[test]
fn test_flat_field_invariance() {
    let colors = [[0, 0, 0], [255, 255, 255], [255, 0, 0], [12, 130, 201]];
    for [r, g, b] in colors {
        let input = RgbaImage::from_pixel(9, 7, Rgba([r, g, b, 255]));
        for radius in [1, 2, 5, 12] {
            for workers in [1, 4, 9] {
                let output = blur(&source_from(input.clone()), workers, radius).unwrap();
                assert!(
                    output.pixels().all(|p| p.0 == [r, g, b, 255]),
                    "color {:?} radius {} workers {}",
                    [r, g, b],
                    radius,
                    workers
                );
            }
        }
    }
}

#[test]
fn test_single_pixel_image_any_radius() {
    let input = RgbaImage::from_pixel(1, 1, Rgba([200, 17, 99, 255]));
    for radius in [1, 2, 7, 30] {
        let output = blur(&source_from(input.clone()), 1, radius).unwrap();
        assert_eq!(output.get_pixel(0, 0).0, [200, 17, 99, 255], "radius {}", radius);
    }
}

#[test]
fn test_worker_count_does_not_change_result() {
    let input = noise_image(23, 19, 7);
    let reference = blur(&source_from(input.clone()), 1, 3).unwrap();
    for workers in [2, 5, 19, 40] {
        let output = blur(&source_from(input.clone()), workers, 3).unwrap();
        assert_eq!(output, reference, "workers {}", workers);
    }
}

#[test]
fn test_blur_reduces_contrast_of_single_bright_pixel() {
    let mut input = RgbaImage::from_pixel(7, 7, Rgba([0, 0, 0, 255]));
    input.put_pixel(3, 3, Rgba([255, 255, 255, 255]));

    let output = blur(&source_from(input), 2, 2).unwrap();
    let center = output.get_pixel(3, 3).0[0];
    let neighbour = output.get_pixel(4, 3).0[0];
    let corner = output.get_pixel(0, 0).0[0];

    assert!(center < 255);
    assert!(neighbour > 0);
    assert!(center > neighbour);
    assert!(neighbour >= corner);
}

#[test]
fn test_zero_workers_rejected() {
    let input = noise_image(4, 4, 3);
    assert!(blur(&source_from(input), 0, 1).is_err());
}

// ============================================================================
// Partition and kernel golden values
// ============================================================================

#[test]
fn test_partition_example_heights() {
    let bands = partition(100, 3).unwrap();
    let heights: Vec<usize> = bands.iter().map(|b| b.height()).collect();
    assert_eq!(heights, vec![33, 33, 34]);
    assert_eq!(bands[0].y_start, 0);
    assert_eq!(bands[2].y_end, 100);
}

#[test]
fn test_radius_one_gaussian_weights_pinned() {
    // exp(-(x² + y²) / 0.5) / (π / 2) at sigma = 0.5
    const GAUSSIAN_R1: [[f64; 3]; 3] = [
        [0.011_660_097_860_112_774, 0.086_157_117_207_394_52, 0.011_660_097_860_112_774],
        [0.086_157_117_207_394_52, 0.636_619_772_367_581_4, 0.086_157_117_207_394_52],
        [0.011_660_097_860_112_774, 0.086_157_117_207_394_52, 0.011_660_097_860_112_774],
    ];

    let kernel = KernelMatrix::generate(1);
    assert_eq!(kernel.size(), 3);
    for (i, row) in GAUSSIAN_R1.iter().enumerate() {
        for (j, expected) in row.iter().enumerate() {
            let actual = kernel.weight(i, j);
            assert!(
                (actual - expected).abs() < 1e-12,
                "({}, {}): {} != {}",
                i,
                j,
                actual,
                expected
            );
        }
    }

    let pinned_sum: f64 = GAUSSIAN_R1.iter().flatten().sum();
    assert!((kernel.sum() - pinned_sum).abs() < 1e-12);
}

#[test]
fn test_radius_one_differs_from_box_but_both_keep_flat_fields() {
    const BOX_3X3: [f64; 9] = [1.0 / 9.0; 9];
    let kernel = KernelMatrix::generate(1);

    // Normalized, both kernels reproduce a constant neighbourhood exactly
    let value = 200.0 * 257.0;
    let box_out: f64 = BOX_3X3.iter().map(|w| w * value).sum::<f64>() / BOX_3X3.iter().sum::<f64>();
    let gauss_out: f64 = kernel.weights().iter().map(|w| w * value).sum::<f64>() / kernel.sum();
    assert!((box_out - value).abs() < 1e-6);
    assert!((gauss_out - value).abs() < 1e-6);

    let input = RgbaImage::from_pixel(3, 3, Rgba([200, 200, 200, 255]));
    let output = blur(&source_from(input), 1, 1).unwrap();
    assert!(output.pixels().all(|p| p.0 == [200, 200, 200, 255]));

    // The Gaussian centre carries most of the mass; the box spreads it evenly
    let centre_share = kernel.weight(1, 1) / kernel.sum();
    assert!(centre_share > 0.6);
    assert!((centre_share - BOX_3X3[4]).abs() > 0.5);
}
