//! Read-only source image with a 16-bit colour accessor
//!
//! Channels are widened to 16 bits the way the codec does it (an 8-bit value
//! `v` becomes `v * 257`) and premultiplied by alpha. Fully opaque pixels
//! keep their colour unchanged.

use image::{DynamicImage, ImageBuffer, Rgba};

/// Decoded request image, immutable for the lifetime of a request
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    width: usize,
    height: usize,
    /// Row-major premultiplied R, G, B
    pixels: Vec<[u16; 3]>,
}

impl SourceImage {
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::from_rgba16(&image.to_rgba16())
    }

    pub fn from_rgba16(buffer: &ImageBuffer<Rgba<u16>, Vec<u16>>) -> Self {
        let pixels = buffer
            .pixels()
            .map(|px| {
                let [r, g, b, a] = px.0;
                [premultiply(r, a), premultiply(g, a), premultiply(b, a)]
            })
            .collect();

        Self {
            width: buffer.width() as usize,
            height: buffer.height() as usize,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// 16-bit-scaled R, G, B at `(x, y)`
    ///
    /// Panics if the coordinate is outside the image; callers clamp first.
    #[inline]
    pub fn color(&self, x: usize, y: usize) -> [u16; 3] {
        debug_assert!(x < self.width && y < self.height, "pixel ({}, {}) out of bounds", x, y);
        self.pixels[y * self.width + x]
    }
}

fn premultiply(channel: u16, alpha: u16) -> u16 {
    ((channel as u32 * alpha as u32) / u16::MAX as u32) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn test_eight_bit_channels_widen_by_257() {
        let img = RgbaImage::from_pixel(2, 1, Rgba([255, 128, 1, 255]));
        let source = SourceImage::from_dynamic(&DynamicImage::ImageRgba8(img));

        assert_eq!(source.width(), 2);
        assert_eq!(source.height(), 1);
        assert_eq!(source.color(1, 0), [65535, 128 * 257, 257]);
    }

    #[test]
    fn test_alpha_premultiplied() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 0, 0]));
        let source = SourceImage::from_dynamic(&DynamicImage::ImageRgba8(img));
        assert_eq!(source.color(0, 0), [0, 0, 0]);

        let img = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 255]));
        let source = SourceImage::from_dynamic(&DynamicImage::ImageRgba8(img));
        assert_eq!(source.color(0, 0), [200 * 257, 100 * 257, 50 * 257]);
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_panics() {
        let img = RgbaImage::new(2, 2);
        let source = SourceImage::from_dynamic(&DynamicImage::ImageRgba8(img));
        source.color(0, 2);
    }
}
