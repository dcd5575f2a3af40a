use image::GrayImage;

use crate::{
    traits::ThresholdStrategy,
    types::{BinaryMask, IntensityGrid, Strategy},
};

/// Single Otsu threshold over the whole grid
#[derive(Debug, Clone, Default)]
pub struct GlobalThreshold;

impl GlobalThreshold {
    /// Level maximising the between-class variance
    pub fn level(&self, grid: &IntensityGrid) -> u8 {
        imageproc::contrast::otsu_level(grid.as_image())
    }
}

impl ThresholdStrategy for GlobalThreshold {
    fn strategy(&self) -> Strategy {
        Strategy::Global
    }

    fn binarize(&self, grid: &IntensityGrid) -> BinaryMask {
        let level = self.level(grid);
        let mut mask = grid.as_image().clone();
        for pixel in mask.pixels_mut() {
            pixel.0[0] = if pixel.0[0] > level {
                BinaryMask::FOREGROUND
            } else {
                BinaryMask::BACKGROUND
            };
        }
        BinaryMask::from_image_unchecked(mask)
    }
}

/// Gaussian-weighted neighbourhood threshold.
///
/// A sample is foreground when it is strictly greater than its local mean
/// minus `offset`. The local mean is rounded to the nearest level, edges are
/// replicated.
#[derive(Debug, Clone)]
pub struct LocalThreshold {
    /// Side of the square window, odd
    pub window: u32,
    pub offset: f64,
}

impl Default for LocalThreshold {
    fn default() -> Self {
        Self {
            window: 11,
            offset: 2.0,
        }
    }
}

impl LocalThreshold {
    /// Sigma implied by the window size
    pub fn sigma(&self) -> f64 {
        0.3 * ((self.window as f64 - 1.0) * 0.5 - 1.0) + 0.8
    }

    /// Normalised 1-D Gaussian weights, applied along both axes
    pub fn kernel(&self) -> Vec<f64> {
        let radius = (self.window / 2) as i64;
        let sigma = self.sigma();
        let weights: Vec<f64> = (-radius..=radius)
            .map(|offset| (-((offset * offset) as f64) / (2.0 * sigma * sigma)).exp())
            .collect();
        let sum: f64 = weights.iter().sum();
        weights.into_iter().map(|w| w / sum).collect()
    }

    /// Gaussian-weighted mean around every sample, row-major
    pub fn local_means(&self, image: &GrayImage) -> Vec<f64> {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let kernel = self.kernel();
        let radius = (kernel.len() / 2) as isize;
        let samples = image.as_raw();

        let clamp = |value: isize, len: usize| value.clamp(0, len as isize - 1) as usize;

        let mut horizontal = vec![0f64; width * height];
        for y in 0..height {
            let row = &samples[y * width..(y + 1) * width];
            for x in 0..width {
                horizontal[y * width + x] = kernel
                    .iter()
                    .enumerate()
                    .map(|(i, weight)| {
                        let sx = clamp(x as isize + i as isize - radius, width);
                        weight * row[sx] as f64
                    })
                    .sum();
            }
        }

        let mut means = vec![0f64; width * height];
        for y in 0..height {
            for x in 0..width {
                means[y * width + x] = kernel
                    .iter()
                    .enumerate()
                    .map(|(i, weight)| {
                        let sy = clamp(y as isize + i as isize - radius, height);
                        weight * horizontal[sy * width + x]
                    })
                    .sum();
            }
        }
        means
    }
}

impl ThresholdStrategy for LocalThreshold {
    fn strategy(&self) -> Strategy {
        Strategy::Local
    }

    fn binarize(&self, grid: &IntensityGrid) -> BinaryMask {
        let means = self.local_means(grid.as_image());
        let mut mask = grid.as_image().clone();
        for (pixel, mean) in mask.pixels_mut().zip(means) {
            let cutoff = mean.round() - self.offset;
            pixel.0[0] = if pixel.0[0] as f64 > cutoff {
                BinaryMask::FOREGROUND
            } else {
                BinaryMask::BACKGROUND
            };
        }
        BinaryMask::from_image_unchecked(mask)
    }
}
