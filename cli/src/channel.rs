use image::{GrayImage, Luma, RgbImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which single channel of a colour image feeds the pipeline
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSource {
    /// HSV hue, 0..=179, stretched to the full 8-bit range
    #[default]
    Hue,
    /// Plain luminance
    Luma,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ChannelConfig {
    pub source: ChannelSource,
    /// Taps of the Gaussian kernel, odd; 0 or 1 disables smoothing
    pub blur_size: u32,
    /// Kernel sigma; zero or below derives it from `blur_size`
    pub blur_sigma: f32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            source: ChannelSource::Hue,
            blur_size: 5,
            blur_sigma: 0.0,
        }
    }
}

/// Channel extracted from a colour image, before and after smoothing
#[derive(Debug, Clone)]
pub struct PreparedChannel {
    pub channel: GrayImage,
    pub smoothed: GrayImage,
}

impl ChannelConfig {
    pub fn prepare(&self, image: &RgbImage) -> PreparedChannel {
        let channel = match self.source {
            ChannelSource::Hue => stretch_to_full_range(&hue_channel(image)),
            ChannelSource::Luma => image::imageops::grayscale(image),
        };
        let smoothed = if self.blur_size > 1 {
            let kernel = gaussian_kernel(self.blur_size, self.blur_sigma);
            imageproc::filter::separable_filter_equal(&channel, &kernel)
        } else {
            channel.clone()
        };
        PreparedChannel { channel, smoothed }
    }
}

/// Sigma used for a kernel of `size` taps when none is given
pub fn derived_sigma(size: u32) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian of `size` taps, rounded up to an odd length
pub fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let size = size.max(1) | 1;
    let sigma = if sigma > 0.0 { sigma } else { derived_sigma(size) };
    let radius = (size / 2) as f32;

    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - radius;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Hue in half degrees, the 8-bit HSV convention
pub fn hue_of(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let max = r.max(g).max(b);
    let delta = max - r.min(g).min(b);
    if delta == 0.0 {
        return 0;
    }

    let mut hue = if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }
    ((hue / 2.0).round() as u32 % 180) as u8
}

pub fn hue_channel(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        Luma([hue_of(r, g, b)])
    })
}

/// Linear min-max stretch to 0..=255; a flat image becomes all zero
pub fn stretch_to_full_range(image: &GrayImage) -> GrayImage {
    let (min, max) = image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
    if min >= max {
        return GrayImage::new(image.width(), image.height());
    }

    let scale = 255.0 / (max - min) as f32;
    let mut stretched = image.clone();
    for pixel in stretched.pixels_mut() {
        pixel.0[0] = ((pixel.0[0] - min) as f32 * scale).round() as u8;
    }
    stretched
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn primary_hues() {
        assert_eq!(hue_of(255, 0, 0), 0);
        assert_eq!(hue_of(255, 255, 0), 30);
        assert_eq!(hue_of(0, 255, 0), 60);
        assert_eq!(hue_of(0, 0, 255), 120);
        assert_eq!(hue_of(255, 0, 255), 150);
        assert_eq!(hue_of(90, 90, 90), 0);
    }

    #[test]
    fn hue_wraps_below_180() {
        // Just short of full red from the magenta side.
        assert!(hue_of(255, 0, 1) < 180);
    }

    #[test]
    fn stretch_maps_extremes_to_full_range() {
        let mut img = GrayImage::new(3, 1);
        img.put_pixel(0, 0, Luma([10]));
        img.put_pixel(1, 0, Luma([20]));
        img.put_pixel(2, 0, Luma([30]));
        let stretched = stretch_to_full_range(&img);
        assert_eq!(stretched.as_raw(), &vec![0, 128, 255]);
    }

    #[test]
    fn flat_channel_stretches_to_zero() {
        let img = GrayImage::from_pixel(4, 4, Luma([77]));
        assert!(stretch_to_full_range(&img).pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn hue_source_separates_colours() {
        let image = RgbImage::from_fn(10, 10, |x, _| {
            if x < 5 { Rgb([200, 30, 30]) } else { Rgb([30, 30, 200]) }
        });
        let config = ChannelConfig {
            source: ChannelSource::Hue,
            blur_size: 0,
            ..ChannelConfig::default()
        };
        let prepared = config.prepare(&image);
        assert_eq!(prepared.channel.get_pixel(0, 0).0[0], 0);
        assert_eq!(prepared.channel.get_pixel(9, 0).0[0], 255);
        assert_eq!(prepared.smoothed, prepared.channel);
    }

    #[test]
    fn smoothing_keeps_dimensions() {
        let image = RgbImage::from_fn(12, 8, |x, y| Rgb([(x * 20) as u8, (y * 30) as u8, 0]));
        let prepared = ChannelConfig {
            source: ChannelSource::Luma,
            ..ChannelConfig::default()
        }
        .prepare(&image);
        assert_eq!(prepared.smoothed.dimensions(), (12, 8));
    }

    #[test]
    fn default_kernel_has_five_taps() {
        let config = ChannelConfig::default();
        assert!((derived_sigma(config.blur_size) - 1.1).abs() < 1e-6);

        let kernel = gaussian_kernel(config.blur_size, config.blur_sigma);
        assert_eq!(kernel.len(), 5);
        assert!((kernel.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(kernel.iter().zip(kernel.iter().rev()).all(|(a, b)| (a - b).abs() < 1e-7));
        assert!(kernel[2] > kernel[1] && kernel[1] > kernel[0]);
    }

    #[test]
    fn even_sizes_round_up() {
        assert_eq!(gaussian_kernel(4, 0.0).len(), 5);
        assert_eq!(gaussian_kernel(0, 0.0), vec![1.0]);
    }

    #[test]
    fn smoothing_keeps_flat_regions_flat() {
        let image = RgbImage::from_pixel(9, 9, Rgb([120, 120, 120]));
        let prepared = ChannelConfig {
            source: ChannelSource::Luma,
            ..ChannelConfig::default()
        }
        .prepare(&image);
        let level = prepared.channel.get_pixel(0, 0).0[0] as i32;
        assert!(prepared
            .smoothed
            .pixels()
            .all(|p| (p.0[0] as i32 - level).abs() <= 1));
    }

    #[test]
    fn smoothing_softens_a_step() {
        let image = RgbImage::from_fn(10, 3, |x, _| {
            if x < 5 { Rgb([0, 0, 0]) } else { Rgb([200, 200, 200]) }
        });
        let prepared = ChannelConfig {
            source: ChannelSource::Luma,
            ..ChannelConfig::default()
        }
        .prepare(&image);
        let left = prepared.smoothed.get_pixel(4, 1).0[0];
        let right = prepared.smoothed.get_pixel(5, 1).0[0];
        assert!(left > 0 && left < 100);
        assert!(right > 100 && right < 200);
        assert_eq!(prepared.smoothed.get_pixel(0, 1).0[0], 0);
    }
}
