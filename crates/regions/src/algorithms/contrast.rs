use image::GrayImage;
use tracing::debug;

use crate::{
    config::ContrastConfig,
    types::{IntensityGrid, Statistics},
};

/// Gamma and histogram correction applied ahead of binarization
#[derive(Debug, Clone, Default)]
pub struct ContrastNormalizer {
    pub config: ContrastConfig,
}

/// Normalized grid together with the decisions that produced it
#[derive(Debug, Clone)]
pub struct Normalization {
    pub grid: IntensityGrid,
    /// Statistics of the grid before correction
    pub input: Statistics,
    pub gamma: f64,
    pub equalized: bool,
}

impl ContrastNormalizer {
    pub fn new(config: ContrastConfig) -> Self {
        Self { config }
    }

    /// Gamma for a grid with the given mean; 1.0 means no correction
    pub fn choose_gamma(&self, mean: f64) -> f64 {
        if mean < self.config.dark_mean {
            self.config.dark_gamma
        } else if mean > self.config.bright_mean {
            self.config.bright_gamma
        } else {
            1.0
        }
    }

    pub fn normalize(&self, grid: &IntensityGrid) -> Normalization {
        let input = grid.statistics();
        let gamma = self.choose_gamma(input.mean);

        let mut image = if (gamma - 1.0).abs() > self.config.gamma_tolerance {
            apply_lut(grid.as_image(), &gamma_lut(gamma))
        } else {
            grid.as_image().clone()
        };

        // Decided on the input spread, applied to the gamma-corrected grid.
        let equalized = input.stddev < self.config.equalize_below_stddev;
        if equalized {
            image = equalize_histogram(&image);
        }

        debug!(
            mean = input.mean,
            stddev = input.stddev,
            gamma,
            equalized,
            "contrast normalized"
        );

        Normalization {
            grid: IntensityGrid::from_image_unchecked(image),
            input,
            gamma,
            equalized,
        }
    }
}

/// Power-law lookup table mapping `x` to `round(255 * (x / 255)^gamma)`
pub fn gamma_lut(gamma: f64) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (level, entry) in lut.iter_mut().enumerate() {
        let corrected = 255.0 * (level as f64 / 255.0).powf(gamma);
        *entry = corrected.round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Full-range histogram equalization.
///
/// The lowest occupied level maps to 0 and the highest to 255. A grid with a
/// single occupied level has nothing to spread and is returned as is.
pub fn equalize_histogram(image: &GrayImage) -> GrayImage {
    let cdf = &imageproc::stats::cumulative_histogram(image).channels[0];
    let total = cdf[255];

    let Some(first) = cdf.iter().position(|&count| count > 0) else {
        return image.clone();
    };
    let floor = cdf[first];
    if floor == total {
        return image.clone();
    }

    let scale = 255.0 / (total - floor) as f64;
    let mut lut = [0u8; 256];
    for level in first..256 {
        lut[level] = ((cdf[level] - floor) as f64 * scale).round().min(255.0) as u8;
    }
    apply_lut(image, &lut)
}

fn apply_lut(image: &GrayImage, lut: &[u8; 256]) -> GrayImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = lut[pixel.0[0] as usize];
    }
    out
}
