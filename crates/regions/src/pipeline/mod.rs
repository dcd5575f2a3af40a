pub mod builder;

use serde::Serialize;
use tracing::info;

use crate::{
    algorithms::{AdaptiveBinarizer, ContrastNormalizer, MaskRefiner, RegionAnalyzer},
    config::PipelineConfig,
    error::Result,
    traits::BoundaryTracer,
    types::{BinaryMask, IntensityGrid, MethodTag, RegionDescriptor, RegionOutline, Statistics},
};

/// The four stages run strictly in order: normalize, binarize, refine, analyze.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    normalizer: ContrastNormalizer,
    binarizer: AdaptiveBinarizer,
    refiner: MaskRefiner,
    analyzer: RegionAnalyzer,
}

/// Everything a run produced, intermediate grids included
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Grid after gamma and equalization
    pub normalized: IntensityGrid,
    /// Mask as produced by the binarizer
    pub mask: BinaryMask,
    pub method: MethodTag,
    pub refined_mask: BinaryMask,
    pub regions: Vec<RegionDescriptor>,
    pub outlines: Vec<RegionOutline>,
    pub diagnostics: Diagnostics,
}

/// Numbers behind each decision taken during a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Diagnostics {
    pub input: Statistics,
    pub gamma: f64,
    pub equalized: bool,
    pub normalized: Statistics,
    pub primary_white_ratio: f64,
    pub white_ratio: f64,
    pub min_area: f64,
    pub traced_contours: usize,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Validate the configuration and create a pipeline with the default tracer
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub(crate) fn from_parts(config: PipelineConfig, tracer: Box<dyn BoundaryTracer>) -> Self {
        Self {
            normalizer: ContrastNormalizer::new(config.contrast.clone()),
            binarizer: AdaptiveBinarizer::new(config.binarize.clone()),
            refiner: MaskRefiner::new(config.refine.clone()),
            analyzer: RegionAnalyzer::with_tracer(config.regions.clone(), tracer),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage on the grid
    pub fn process(&self, grid: &IntensityGrid) -> Result<PipelineOutput> {
        let normalization = self.normalizer.normalize(grid);
        let binarization = self.binarizer.binarize(&normalization.grid);
        let refined_mask = self.refiner.refine(&binarization.mask);
        let analysis = self.analyzer.analyze(&refined_mask)?;

        info!(
            width = grid.width(),
            height = grid.height(),
            method = %binarization.method,
            regions = analysis.regions.len(),
            "pipeline finished"
        );

        Ok(PipelineOutput {
            normalized: normalization.grid,
            mask: binarization.mask,
            method: binarization.method,
            refined_mask,
            regions: analysis.regions,
            outlines: analysis.outlines,
            diagnostics: Diagnostics {
                input: normalization.input,
                gamma: normalization.gamma,
                equalized: normalization.equalized,
                normalized: binarization.stats,
                primary_white_ratio: binarization.primary_white_ratio,
                white_ratio: binarization.white_ratio,
                min_area: analysis.min_area,
                traced_contours: analysis.traced,
            },
        })
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "Pipeline: stddev cutoff {}, white ratio window ({}, {}), element {}, min area factor {}, {:?} contours",
            self.config.binarize.stddev_cutoff,
            self.config.binarize.min_white_ratio,
            self.config.binarize.max_white_ratio,
            self.config.refine.element_size,
            self.config.regions.min_area_factor,
            self.config.regions.selection,
        )
    }
}
