use crate::{
    error::Result,
    types::{BinaryMask, IntensityGrid, Strategy, TracedContour},
};

/// Trait for binarization strategies
pub trait ThresholdStrategy: Send + Sync {
    /// Which strategy this is, used for method tagging
    fn strategy(&self) -> Strategy;

    /// Split the grid into foreground and background
    fn binarize(&self, grid: &IntensityGrid) -> BinaryMask;
}

/// Trait for boundary tracing algorithms
pub trait BoundaryTracer: Send + Sync {
    /// Trace every closed boundary of the mask, outer and hole, in discovery order
    fn trace(&self, mask: &BinaryMask) -> Result<Vec<TracedContour>>;
}
