use tracing::{debug, warn};

use crate::{
    algorithms::threshold::{GlobalThreshold, LocalThreshold},
    config::BinarizeConfig,
    traits::ThresholdStrategy,
    types::{BinaryMask, IntensityGrid, MethodTag, Statistics, Strategy},
};

/// Chooses between global and local thresholding and falls back to the
/// other one when the primary mask looks implausible.
#[derive(Debug, Clone)]
pub struct AdaptiveBinarizer {
    pub config: BinarizeConfig,
    global: GlobalThreshold,
    local: LocalThreshold,
}

/// Mask plus the evidence behind the chosen method
#[derive(Debug, Clone)]
pub struct Binarization {
    pub mask: BinaryMask,
    pub method: MethodTag,
    /// Statistics of the grid that was thresholded
    pub stats: Statistics,
    /// White ratio of the primary strategy's mask
    pub primary_white_ratio: f64,
    /// White ratio of the returned mask
    pub white_ratio: f64,
}

impl Default for AdaptiveBinarizer {
    fn default() -> Self {
        Self::new(BinarizeConfig::default())
    }
}

impl AdaptiveBinarizer {
    pub fn new(config: BinarizeConfig) -> Self {
        let local = LocalThreshold {
            window: config.local_window,
            offset: config.local_offset,
        };
        Self {
            config,
            global: GlobalThreshold,
            local,
        }
    }

    /// Strategy tried first for a grid with the given spread
    pub fn primary_for(&self, stats: &Statistics) -> Strategy {
        if stats.stddev > self.config.stddev_cutoff {
            Strategy::Global
        } else {
            Strategy::Local
        }
    }

    /// Whether a mask with this white ratio is plausible
    pub fn accepts(&self, white_ratio: f64) -> bool {
        self.config.min_white_ratio < white_ratio && white_ratio < self.config.max_white_ratio
    }

    pub fn strategy(&self, strategy: Strategy) -> &dyn ThresholdStrategy {
        match strategy {
            Strategy::Global => &self.global,
            Strategy::Local => &self.local,
        }
    }

    pub fn binarize(&self, grid: &IntensityGrid) -> Binarization {
        let stats = grid.statistics();
        let primary = self.primary_for(&stats);

        let mask = self.strategy(primary).binarize(grid);
        let primary_white_ratio = mask.white_ratio();
        debug!(
            stddev = stats.stddev,
            %primary,
            white_ratio = primary_white_ratio,
            "primary threshold applied"
        );

        if self.accepts(primary_white_ratio) {
            return Binarization {
                mask,
                method: MethodTag::accepted(primary),
                stats,
                primary_white_ratio,
                white_ratio: primary_white_ratio,
            };
        }

        // The fallback mask is taken as is, even when its ratio is also
        // outside the window.
        let fallback = primary.alternate();
        let mask = self.strategy(fallback).binarize(grid);
        let white_ratio = mask.white_ratio();
        let method = MethodTag::fallback_from(primary);
        if !self.accepts(white_ratio) {
            warn!(%method, white_ratio, "fallback mask is outside the accepted white ratio window");
        } else {
            debug!(%method, white_ratio, "fallback threshold applied");
        }

        Binarization {
            mask,
            method,
            stats,
            primary_white_ratio,
            white_ratio,
        }
    }
}
