//! # Adaptive Binarization and Region Metrics
//!
//! Turns a single-channel intensity grid into a clean binary mask and a list
//! of shape descriptors for the connected regions it contains.
//!
//! ## Core Features
//!
//! - **Contrast normalization**: gamma correction for dark or bright grids,
//!   histogram equalization for flat ones
//! - **Adaptive binarization**: Otsu or Gaussian-local thresholding chosen from
//!   the grid's spread, with a white-ratio check and a fallback
//! - **Mask refinement**: morphological closing followed by opening
//! - **Region metrics**: area, perimeter, circularity and minimum-area
//!   rotated rectangle of every traced contour above a resolution-relative
//!   area threshold
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use regions::{IntensityGrid, Pipeline};
//!
//! let image = image::open("sample.png")?.to_luma8();
//! let grid = IntensityGrid::new(image)?;
//!
//! let output = Pipeline::builder().build()?.process(&grid)?;
//! println!("{} regions via {}", output.regions.len(), output.method);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use regions::{ContourSelection, Pipeline, RegionConfig};
//!
//! let pipeline = Pipeline::builder()
//!     .with_element_size(3)
//!     .regions(RegionConfig {
//!         selection: ContourSelection::OuterOnly,
//!         ..RegionConfig::default()
//!     })
//!     .build()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod config;
pub mod traits;
pub mod algorithms;
pub mod pipeline;

// Re-exports for convenience
pub use error::{InputProblem, RegionError, Result};
pub use types::*;
pub use config::*;
pub use traits::*;
pub use algorithms::*;
pub use pipeline::{builder::PipelineBuilder, Diagnostics, Pipeline, PipelineOutput};

/// Run the full pipeline with the default configuration
pub fn process(grid: &IntensityGrid) -> Result<PipelineOutput> {
    Pipeline::builder().build()?.process(grid)
}
