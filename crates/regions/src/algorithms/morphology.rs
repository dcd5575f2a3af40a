use imageproc::distance_transform::Norm;
use tracing::debug;

use crate::{config::RefineConfig, types::BinaryMask};

/// Closing followed by opening with a square structuring element.
///
/// Closing first merges nearby fragments and fills pinholes so that the
/// opening does not erase thin structures it would otherwise break apart.
#[derive(Debug, Clone, Default)]
pub struct MaskRefiner {
    pub config: RefineConfig,
}

impl MaskRefiner {
    pub fn new(config: RefineConfig) -> Self {
        Self { config }
    }

    pub fn refine(&self, mask: &BinaryMask) -> BinaryMask {
        let radius = self.config.radius();
        if radius == 0 {
            return mask.clone();
        }

        // A Chebyshev ball of radius r is the (2r+1)x(2r+1) square.
        let closed = imageproc::morphology::close(mask.as_image(), Norm::LInf, radius);
        let opened = imageproc::morphology::open(&closed, Norm::LInf, radius);
        let refined = BinaryMask::from_image_unchecked(opened);

        debug!(
            element = self.config.element_size,
            before = mask.foreground_count(),
            after = refined.foreground_count(),
            "mask refined"
        );
        refined
    }
}
