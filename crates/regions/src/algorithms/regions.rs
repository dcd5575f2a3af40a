use std::fmt;

use tracing::debug;

use crate::{
    algorithms::{
        extraction::ImageprocBoundaryTracer,
        metrics::{aspect_ratio, polygon_of, ShapeMetrics},
    },
    config::RegionConfig,
    error::Result,
    traits::BoundaryTracer,
    types::{BinaryMask, RegionDescriptor, RegionOutline},
};

/// Traces a mask, drops small contours and measures the rest
pub struct RegionAnalyzer {
    pub config: RegionConfig,
    tracer: Box<dyn BoundaryTracer>,
}

/// Surviving regions, in contour discovery order
#[derive(Debug, Clone, Default)]
pub struct RegionAnalysis {
    pub regions: Vec<RegionDescriptor>,
    pub outlines: Vec<RegionOutline>,
    /// Area a contour had to strictly exceed
    pub min_area: f64,
    /// Contours returned by the tracer before selection and filtering
    pub traced: usize,
}

impl fmt::Debug for RegionAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionAnalyzer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for RegionAnalyzer {
    fn default() -> Self {
        Self::new(RegionConfig::default())
    }
}

impl RegionAnalyzer {
    pub fn new(config: RegionConfig) -> Self {
        Self::with_tracer(config, Box::new(ImageprocBoundaryTracer))
    }

    pub fn with_tracer(config: RegionConfig, tracer: Box<dyn BoundaryTracer>) -> Self {
        Self { config, tracer }
    }

    pub fn analyze(&self, mask: &BinaryMask) -> Result<RegionAnalysis> {
        let min_area = self.config.min_area(mask.width(), mask.height());
        let contours = self.tracer.trace(mask)?;
        let traced = contours.len();

        let mut regions = Vec::new();
        let mut outlines = Vec::new();

        for contour in contours
            .into_iter()
            .filter(|contour| self.config.selection.admits(contour.kind))
        {
            let polygon = polygon_of(&contour.points);
            let shape = ShapeMetrics::measure(&polygon);
            if shape.area <= min_area {
                continue;
            }

            let id = regions.len();
            let rect = shape.rect;
            regions.push(RegionDescriptor {
                id,
                area: shape.area,
                perimeter: shape.perimeter,
                circularity: shape.circularity,
                center: rect.center,
                width: rect.width,
                height: rect.height,
                aspect_ratio: aspect_ratio(rect.width, rect.height, self.config.aspect_epsilon),
                orientation_degrees: rect.angle_degrees,
                boundary: contour.kind,
            });
            outlines.push(RegionOutline {
                id,
                points: contour.points.iter().map(|p| [p.x, p.y]).collect(),
                rect,
            });
        }

        debug!(
            traced,
            kept = regions.len(),
            min_area,
            selection = ?self.config.selection,
            "regions analyzed"
        );

        Ok(RegionAnalysis {
            regions,
            outlines,
            min_area,
            traced,
        })
    }
}
