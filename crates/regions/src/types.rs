use image::{GrayImage, Luma};
use imageproc::point::Point;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::{InputProblem, Result};

/// Immutable single-channel 8-bit grid fed into the pipeline.
///
/// Every constructor rejects grids with a zero dimension, so stages can rely
/// on at least one sample being present.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityGrid {
    image: GrayImage,
}

impl IntensityGrid {
    /// Wrap an existing grayscale image
    pub fn new(image: GrayImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(InputProblem::ZeroDimension { width, height }.into());
        }
        Ok(Self { image })
    }

    /// Build a grid from a row-major sample buffer
    pub fn from_raw(width: u32, height: u32, samples: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(InputProblem::ZeroDimension { width, height }.into());
        }
        let expected = width as usize * height as usize;
        let actual = samples.len();
        let image = GrayImage::from_raw(width, height, samples)
            .ok_or(InputProblem::LengthMismatch { expected, actual })?;
        Ok(Self { image })
    }

    /// Build a grid from wider integer samples, rejecting anything outside the 8-bit range
    pub fn from_samples<T>(width: u32, height: u32, samples: &[T]) -> Result<Self>
    where
        T: Copy + Into<i64>,
    {
        let bytes = samples
            .iter()
            .enumerate()
            .map(|(index, &sample)| {
                let value: i64 = sample.into();
                u8::try_from(value).map_err(|_| InputProblem::SampleOutOfRange { index, value })
            })
            .collect::<std::result::Result<Vec<u8>, _>>()?;
        Self::from_raw(width, height, bytes)
    }

    /// Build a grid from rows, which must be non-empty and rectangular
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self> {
        let first = rows.first().ok_or(InputProblem::Empty)?;
        let width = first.len();
        let mut samples = Vec::with_capacity(width * rows.len());
        for (row, values) in rows.iter().enumerate() {
            if values.len() != width {
                return Err(InputProblem::Ragged {
                    row,
                    expected: width,
                    actual: values.len(),
                }
                .into());
            }
            samples.extend_from_slice(values);
        }
        Self::from_raw(width as u32, rows.len() as u32, samples)
    }

    /// A grid where every sample has the same value
    pub fn filled(width: u32, height: u32, value: u8) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(InputProblem::ZeroDimension { width, height }.into());
        }
        Ok(Self {
            image: GrayImage::from_pixel(width, height, Luma([value])),
        })
    }

    pub(crate) fn from_image_unchecked(image: GrayImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel_count(&self) -> usize {
        self.image.width() as usize * self.image.height() as usize
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.image.get_pixel(x, y).0[0]
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// Mean and population standard deviation of all samples
    pub fn statistics(&self) -> Statistics {
        Statistics::of(&self.image)
    }
}

impl TryFrom<GrayImage> for IntensityGrid {
    type Error = crate::error::RegionError;

    fn try_from(image: GrayImage) -> Result<Self> {
        Self::new(image)
    }
}

/// Global intensity statistics of a grid.
///
/// Always recomputed from the grid at hand; contrast correction changes the
/// distribution so values from an earlier stage are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Statistics {
    pub mean: f64,
    pub stddev: f64,
}

impl Statistics {
    pub fn of(image: &GrayImage) -> Self {
        let hist = &imageproc::stats::histogram(image).channels[0];
        let total: f64 = hist.iter().map(|&count| count as f64).sum();
        if total == 0.0 {
            return Self { mean: 0.0, stddev: 0.0 };
        }

        let mean = hist
            .iter()
            .enumerate()
            .map(|(level, &count)| level as f64 * count as f64)
            .sum::<f64>()
            / total;
        let variance = hist
            .iter()
            .enumerate()
            .map(|(level, &count)| {
                let delta = level as f64 - mean;
                delta * delta * count as f64
            })
            .sum::<f64>()
            / total;

        Self {
            mean,
            stddev: variance.sqrt(),
        }
    }
}

/// Two-level mask whose samples are exactly [`BinaryMask::BACKGROUND`] or
/// [`BinaryMask::FOREGROUND`].
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    image: GrayImage,
}

impl BinaryMask {
    pub const FOREGROUND: u8 = 255;
    pub const BACKGROUND: u8 = 0;

    /// Wrap a caller-built mask, rejecting grey levels and empty images
    pub fn try_from_image(image: GrayImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(InputProblem::ZeroDimension { width, height }.into());
        }
        if let Some((x, y, pixel)) = image
            .enumerate_pixels()
            .find(|(_, _, p)| p.0[0] != Self::FOREGROUND && p.0[0] != Self::BACKGROUND)
        {
            return Err(InputProblem::NonBinarySample { x, y, value: pixel.0[0] }.into());
        }
        Ok(Self { image })
    }

    /// Callers inside the crate guarantee the two-level invariant.
    pub(crate) fn from_image_unchecked(image: GrayImage) -> Self {
        debug_assert!(image
            .pixels()
            .all(|p| p.0[0] == Self::FOREGROUND || p.0[0] == Self::BACKGROUND));
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y).0[0] == Self::FOREGROUND
    }

    pub fn foreground_count(&self) -> usize {
        self.image
            .pixels()
            .filter(|p| p.0[0] == Self::FOREGROUND)
            .count()
    }

    /// Fraction of samples set to the foreground value
    pub fn white_ratio(&self) -> f64 {
        let total = self.image.width() as f64 * self.image.height() as f64;
        if total == 0.0 {
            return 0.0;
        }
        self.foreground_count() as f64 / total
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }
}

/// One of the two binarization strategies
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Strategy {
    /// Single Otsu threshold over the whole grid
    Global,
    /// Gaussian-weighted neighbourhood threshold
    Local,
}

impl Strategy {
    pub fn alternate(self) -> Self {
        match self {
            Self::Global => Self::Local,
            Self::Local => Self::Global,
        }
    }
}

/// Records which strategy was tried first and whether it was kept.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MethodTag {
    /// Global threshold accepted
    Global,
    /// Global threshold rejected, mask produced by the local strategy
    GlobalFallback,
    /// Local threshold accepted
    Local,
    /// Local threshold rejected, mask produced by the global strategy
    LocalFallback,
}

impl MethodTag {
    pub fn accepted(primary: Strategy) -> Self {
        match primary {
            Strategy::Global => Self::Global,
            Strategy::Local => Self::Local,
        }
    }

    pub fn fallback_from(primary: Strategy) -> Self {
        match primary {
            Strategy::Global => Self::GlobalFallback,
            Strategy::Local => Self::LocalFallback,
        }
    }

    /// The strategy that was tried first
    pub fn primary(self) -> Strategy {
        match self {
            Self::Global | Self::GlobalFallback => Strategy::Global,
            Self::Local | Self::LocalFallback => Strategy::Local,
        }
    }

    /// The strategy that actually produced the mask
    pub fn producer(self) -> Strategy {
        if self.is_fallback() {
            self.primary().alternate()
        } else {
            self.primary()
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Self::GlobalFallback | Self::LocalFallback)
    }
}

/// Side of a region a traced boundary belongs to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BoundaryKind {
    Outer,
    Hole,
}

/// A closed boundary as returned by a tracer
#[derive(Debug, Clone, PartialEq)]
pub struct TracedContour {
    /// Boundary pixels in trace order, compressed to run endpoints
    pub points: Vec<Point<i32>>,
    pub kind: BoundaryKind,
    /// Index of the enclosing contour in the tracer's output
    pub parent: Option<usize>,
}

/// Minimum-area rectangle enclosing a contour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RotatedRect {
    pub center: [f64; 2],
    pub width: f64,
    pub height: f64,
    /// Angle of the `width` side from the +x axis, in (0, 90]
    pub angle_degrees: f64,
    pub corners: [[f64; 2]; 4],
}

/// Shape metrics of one region that survived area filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RegionDescriptor {
    /// Zero-based index in filtering order, not a stable identity
    pub id: usize,
    pub area: f64,
    pub perimeter: f64,
    pub circularity: f64,
    pub center: [f64; 2],
    pub width: f64,
    pub height: f64,
    pub aspect_ratio: f64,
    pub orientation_degrees: f64,
    pub boundary: BoundaryKind,
}

/// Geometry behind a descriptor, kept for drawing and debugging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionOutline {
    pub id: usize,
    pub points: Vec<[i32; 2]>,
    pub rect: RotatedRect,
}
