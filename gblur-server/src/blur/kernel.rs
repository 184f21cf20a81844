//! Gaussian kernel generation
//!
//! For radius `r` the kernel is a `(2r+1) x (2r+1)` matrix with
//! `sigma = r / 2`:
//!
//! ```text
//! w(i, j) = exp(-(x² + y²) / (2·sigma²)) / (2·π·sigma²),   x = i - r, y = j - r
//! ```
//!
//! Weights are not normalized in place; every output pixel divides by
//! [`KernelMatrix::sum`] instead. Radius 0 would give `sigma = 0`, so it is
//! special-cased to the 1x1 identity kernel.

use std::f64::consts::PI;

/// Square matrix of non-negative Gaussian weights
#[derive(Debug, Clone, PartialEq)]
pub struct KernelMatrix {
    radius: usize,
    size: usize,
    /// Row-major by first index `i`
    weights: Vec<f64>,
    sum: f64,
}

impl KernelMatrix {
    /// Build the kernel for `radius`
    pub fn generate(radius: usize) -> Self {
        if radius == 0 {
            return Self {
                radius: 0,
                size: 1,
                weights: vec![1.0],
                sum: 1.0,
            };
        }

        let size = 2 * radius + 1;
        let sigma = radius as f64 / 2.0;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let scale = PI * two_sigma_sq;
        let r = radius as f64;

        let mut weights = Vec::with_capacity(size * size);
        for i in 0..size {
            let x = i as f64 - r;
            for j in 0..size {
                let y = j as f64 - r;
                weights.push((-(x * x + y * y) / two_sigma_sq).exp() / scale);
            }
        }
        let sum = weights.iter().sum();

        Self {
            radius,
            size,
            weights,
            sum,
        }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Dimension `d = 2r + 1`
    pub fn size(&self) -> usize {
        self.size
    }

    /// Weight at zero-based indices `(i, j)`, both in `[0, size)`
    #[inline]
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.weights[i * self.size + j]
    }

    /// Normalization divisor used by every output pixel
    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}
