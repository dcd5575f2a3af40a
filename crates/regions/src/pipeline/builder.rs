use crate::{
    algorithms::ImageprocBoundaryTracer,
    config::{BinarizeConfig, ContrastConfig, PipelineConfig, RefineConfig, RegionConfig},
    error::Result,
    pipeline::Pipeline,
    traits::BoundaryTracer,
};

/// Builder for creating processing pipelines with a fluent API
#[derive(Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    tracer: Option<Box<dyn BoundaryTracer>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn contrast(mut self, contrast: ContrastConfig) -> Self {
        self.config.contrast = contrast;
        self
    }

    pub fn binarize(mut self, binarize: BinarizeConfig) -> Self {
        self.config.binarize = binarize;
        self
    }

    pub fn refine(mut self, refine: RefineConfig) -> Self {
        self.config.refine = refine;
        self
    }

    pub fn regions(mut self, regions: RegionConfig) -> Self {
        self.config.regions = regions;
        self
    }

    /// Side of the square structuring element used by the refiner
    pub fn with_element_size(mut self, element_size: u32) -> Self {
        self.config.refine.element_size = element_size;
        self
    }

    /// Set the boundary tracer (replaces any existing one)
    pub fn set_tracer<T>(mut self, tracer: T) -> Self
    where
        T: BoundaryTracer + 'static,
    {
        self.tracer = Some(Box::new(tracer));
        self
    }

    /// Validate the configuration and build the pipeline
    pub fn build(self) -> Result<Pipeline> {
        self.config.validate()?;

        let tracer = self
            .tracer
            .unwrap_or_else(|| Box::new(ImageprocBoundaryTracer));

        Ok(Pipeline::from_parts(self.config, tracer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::RegionError,
        types::{BinaryMask, IntensityGrid, TracedContour},
    };

    #[test]
    fn defaults_build() {
        let pipeline = PipelineBuilder::new().build().expect("default pipeline");
        assert_eq!(pipeline.config(), &PipelineConfig::default());
    }

    #[test]
    fn invalid_sections_are_rejected() {
        let result = PipelineBuilder::new().with_element_size(4).build();
        assert!(matches!(result, Err(RegionError::InvalidConfig(_))));

        let result = PipelineBuilder::new()
            .binarize(BinarizeConfig {
                min_white_ratio: 0.8,
                max_white_ratio: 0.2,
                ..BinarizeConfig::default()
            })
            .build();
        assert!(matches!(result, Err(RegionError::InvalidConfig(_))));

        let result = PipelineBuilder::new()
            .regions(RegionConfig {
                min_area_factor: -1.0,
                ..RegionConfig::default()
            })
            .build();
        assert!(matches!(result, Err(RegionError::InvalidConfig(_))));
    }

    struct NoContours;

    impl BoundaryTracer for NoContours {
        fn trace(&self, _mask: &BinaryMask) -> Result<Vec<TracedContour>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn custom_tracer_is_used() {
        let pipeline = PipelineBuilder::new()
            .set_tracer(NoContours)
            .build()
            .expect("pipeline");
        let mut samples = vec![0u8; 40 * 40];
        for (index, sample) in samples.iter_mut().enumerate() {
            let (x, y) = (index % 40, index / 40);
            if (10..30).contains(&x) && (10..30).contains(&y) {
                *sample = 255;
            }
        }
        let grid = IntensityGrid::from_raw(40, 40, samples).expect("grid");
        let output = pipeline.process(&grid).expect("process");

        assert!(output.regions.is_empty());
        assert_eq!(output.diagnostics.traced_contours, 0);
    }
}
