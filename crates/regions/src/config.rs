//! Tunable thresholds for every pipeline stage.
//!
//! Defaults are the fixed values the pipeline has always used. Each section
//! deserializes with `#[serde(default)]`, so a config file only needs the
//! keys it overrides.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{RegionError, Result},
    types::BoundaryKind,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PipelineConfig {
    pub contrast: ContrastConfig,
    pub binarize: BinarizeConfig,
    pub refine: RefineConfig,
    pub regions: RegionConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.contrast.validate()?;
        self.binarize.validate()?;
        self.refine.validate()?;
        self.regions.validate()
    }

    /// JSON schema of the configuration file format
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(PipelineConfig)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ContrastConfig {
    /// Grids with a mean strictly below this are brightened
    pub dark_mean: f64,
    /// Grids with a mean strictly above this are darkened
    pub bright_mean: f64,
    pub dark_gamma: f64,
    pub bright_gamma: f64,
    /// Gamma values within this distance of 1.0 are skipped
    pub gamma_tolerance: f64,
    /// Equalize when the input standard deviation is strictly below this
    pub equalize_below_stddev: f64,
}

impl Default for ContrastConfig {
    fn default() -> Self {
        Self {
            dark_mean: 60.0,
            bright_mean: 190.0,
            dark_gamma: 1.5,
            bright_gamma: 0.7,
            gamma_tolerance: 0.01,
            equalize_below_stddev: 30.0,
        }
    }
}

impl ContrastConfig {
    fn validate(&self) -> Result<()> {
        if !(self.dark_mean <= self.bright_mean) {
            return Err(invalid(format!(
                "contrast.dark_mean ({}) must not exceed contrast.bright_mean ({})",
                self.dark_mean, self.bright_mean
            )));
        }
        for (name, gamma) in [("dark_gamma", self.dark_gamma), ("bright_gamma", self.bright_gamma)] {
            if !(gamma.is_finite() && gamma > 0.0) {
                return Err(invalid(format!("contrast.{name} must be positive, got {gamma}")));
            }
        }
        if !(self.gamma_tolerance >= 0.0) {
            return Err(invalid("contrast.gamma_tolerance must be non-negative".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BinarizeConfig {
    /// Grids with a standard deviation strictly above this try Global first
    pub stddev_cutoff: f64,
    /// Exclusive lower bound of an acceptable white ratio
    pub min_white_ratio: f64,
    /// Exclusive upper bound of an acceptable white ratio
    pub max_white_ratio: f64,
    /// Side of the square local-threshold window, odd
    #[schemars(range(min = 3))]
    pub local_window: u32,
    /// Subtracted from the local mean before comparison
    pub local_offset: f64,
}

impl Default for BinarizeConfig {
    fn default() -> Self {
        Self {
            stddev_cutoff: 30.0,
            min_white_ratio: 0.01,
            max_white_ratio: 0.70,
            local_window: 11,
            local_offset: 2.0,
        }
    }
}

impl BinarizeConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_white_ratio)
            || !(0.0..=1.0).contains(&self.max_white_ratio)
            || self.min_white_ratio >= self.max_white_ratio
        {
            return Err(invalid(format!(
                "binarize white ratio window ({}, {}) must lie in [0, 1] with min < max",
                self.min_white_ratio, self.max_white_ratio
            )));
        }
        if self.local_window < 3 || self.local_window % 2 == 0 {
            return Err(invalid(format!(
                "binarize.local_window must be odd and at least 3, got {}",
                self.local_window
            )));
        }
        if !self.local_offset.is_finite() {
            return Err(invalid("binarize.local_offset must be finite".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RefineConfig {
    /// Side of the square structuring element, odd; 1 disables refinement
    #[schemars(range(min = 1, max = 511))]
    pub element_size: u32,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self { element_size: 5 }
    }
}

impl RefineConfig {
    fn validate(&self) -> Result<()> {
        if self.element_size == 0 || self.element_size % 2 == 0 || self.element_size > 511 {
            return Err(invalid(format!(
                "refine.element_size must be odd and within 1..=511, got {}",
                self.element_size
            )));
        }
        Ok(())
    }

    /// Chebyshev radius of the structuring element
    pub fn radius(&self) -> u8 {
        (self.element_size / 2) as u8
    }
}

/// Which traced boundaries take part in area filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContourSelection {
    /// Outer and hole boundaries alike
    #[default]
    All,
    /// Outer boundaries only
    OuterOnly,
}

impl ContourSelection {
    pub fn admits(self, kind: BoundaryKind) -> bool {
        match self {
            Self::All => true,
            Self::OuterOnly => kind == BoundaryKind::Outer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RegionConfig {
    /// Fraction of the mask area a contour must strictly exceed
    pub min_area_factor: f64,
    /// Added to the short side when computing the aspect ratio
    pub aspect_epsilon: f64,
    pub selection: ContourSelection,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            min_area_factor: 0.00005,
            aspect_epsilon: 1e-9,
            selection: ContourSelection::All,
        }
    }
}

impl RegionConfig {
    fn validate(&self) -> Result<()> {
        if !(self.min_area_factor.is_finite() && self.min_area_factor >= 0.0) {
            return Err(invalid(format!(
                "regions.min_area_factor must be a non-negative number, got {}",
                self.min_area_factor
            )));
        }
        if !(self.aspect_epsilon.is_finite() && self.aspect_epsilon > 0.0) {
            return Err(invalid("regions.aspect_epsilon must be positive".to_string()));
        }
        Ok(())
    }

    /// Area threshold for a mask of the given size
    pub fn min_area(&self, width: u32, height: u32) -> f64 {
        self.min_area_factor * width as f64 * height as f64
    }
}

fn invalid(message: String) -> RegionError {
    RegionError::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PipelineConfig::default().validate().expect("defaults should validate");
    }

    #[test]
    fn even_window_is_rejected() {
        let mut config = PipelineConfig::default();
        config.binarize.local_window = 10;
        assert!(matches!(config.validate(), Err(RegionError::InvalidConfig(_))));
    }

    #[test]
    fn inverted_ratio_window_is_rejected() {
        let mut config = PipelineConfig::default();
        config.binarize.min_white_ratio = 0.8;
        config.binarize.max_white_ratio = 0.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn even_element_is_rejected() {
        let mut config = PipelineConfig::default();
        config.refine.element_size = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "refine": { "element_size": 3 }, "regions": { "selection": "outer_only" } }"#)
                .expect("partial config should parse");
        assert_eq!(config.refine.element_size, 3);
        assert_eq!(config.regions.selection, ContourSelection::OuterOnly);
        assert_eq!(config.binarize, BinarizeConfig::default());
        assert_eq!(config.contrast, ContrastConfig::default());
    }

    #[test]
    fn min_area_scales_with_resolution() {
        let regions = RegionConfig::default();
        assert!((regions.min_area(200, 200) - 2.0).abs() < 1e-12);
        assert!((regions.min_area(400, 400) - 8.0).abs() < 1e-12);
    }
}
