pub mod artifacts;
pub mod batch;
pub mod channel;

use regions::PipelineConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use artifacts::{process_image, ImageReport};
pub use batch::{collect_inputs, process_batch, BatchSummary};
pub use channel::{ChannelConfig, ChannelSource};

/// Extensions picked up when a directory is processed, compared lowercase
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[error(transparent)]
    RegionError(#[from] regions::RegionError),
    #[error("Input path has no file name: {0:?}")]
    MissingFileName(PathBuf),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
    #[error("Input is neither a directory nor a supported image: {0:?}")]
    UnsupportedInput(PathBuf),
    #[error("Worker failed: {0}")]
    Worker(String),
}

/// Configuration file for the command line tool.
///
/// Pipeline sections sit at the top level next to `[channel]`, so a file
/// written for the library loads unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct CliConfig {
    pub channel: ChannelConfig,
    #[serde(flatten)]
    pub pipeline: PipelineConfig,
}

impl CliConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        let config: CliConfig = toml::from_str(content)?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        let config: CliConfig = serde_json::from_str(content)?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Save configuration, choosing the format from the extension
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let path_ref = path.as_ref();
        let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(CliError::UnsupportedFileFormat),
        };
        fs::write(path_ref, content)?;
        Ok(())
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> Result<String, CliError> {
        let toml = toml::to_string_pretty(&self)?;
        Ok(toml)
    }

    /// Convert configuration to JSON string
    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// JSON schema of the configuration file, pretty printed
    pub fn schema_json() -> Result<String, CliError> {
        let schema = schemars::schema_for!(CliConfig);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Image files directly inside `dir`, sorted by path
pub fn list_images<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, CliError> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_path(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regions::ContourSelection;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = CliConfig::from_toml(
            r#"
            [channel]
            source = "luma"

            [refine]
            element_size = 3

            [regions]
            selection = "outer_only"
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.channel.source, ChannelSource::Luma);
        assert_eq!(config.pipeline.refine.element_size, 3);
        assert_eq!(config.pipeline.regions.selection, ContourSelection::OuterOnly);
        assert_eq!(config.pipeline.binarize, regions::BinarizeConfig::default());
    }

    #[test]
    fn invalid_pipeline_section_is_rejected() {
        let result = CliConfig::from_json(r#"{ "binarize": { "local_window": 8 } }"#);
        assert!(matches!(
            result,
            Err(CliError::RegionError(regions::RegionError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            CliConfig::from_file("config.yaml"),
            Err(CliError::UnsupportedFileFormat)
        ));
    }

    #[test]
    fn config_files_round_trip_through_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut config = CliConfig::default();
        config.pipeline.refine.element_size = 7;
        config.channel.blur_size = 3;
        config.channel.blur_sigma = 0.8;

        for name in ["config.toml", "config.json"] {
            let path = dir.path().join(name);
            config.to_file(&path).expect("write config");
            assert_eq!(CliConfig::from_file(&path).expect("read config"), config);
        }
    }

    #[test]
    fn schema_lists_every_section() {
        let schema = CliConfig::schema_json().expect("schema");
        for section in ["channel", "contrast", "binarize", "refine", "regions"] {
            assert!(schema.contains(section), "schema should mention {section}");
        }
    }

    #[test]
    fn directory_listing_filters_by_extension() {
        let dir = tempfile::tempdir().expect("temp dir");
        for name in ["b.PNG", "a.jpg", "c.tiff", "notes.txt", "d.jpeg.bak"] {
            fs::write(dir.path().join(name), b"").expect("write file");
        }
        fs::create_dir(dir.path().join("nested.png")).expect("create dir");

        let names: Vec<String> = list_images(dir.path())
            .expect("list")
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect();
        assert_eq!(names, ["a.jpg", "b.PNG", "c.tiff"]);
    }
}
