use thiserror::Error;

/// Why a grid or mask handed to the pipeline was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputProblem {
    #[error("grid has no rows")]
    Empty,

    #[error("grid has a zero dimension ({width}x{height})")]
    ZeroDimension { width: u32, height: u32 },

    #[error("expected {expected} samples, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("row {row} has {actual} samples, expected {expected}")]
    Ragged { row: usize, expected: usize, actual: usize },

    #[error("sample {index} has value {value}, outside 0..=255")]
    SampleOutOfRange { index: usize, value: i64 },

    #[error("mask sample at ({x}, {y}) is {value}, expected 0 or 255")]
    NonBinarySample { x: u32, y: u32, value: u8 },
}

#[derive(Error, Debug)]
pub enum RegionError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputProblem),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Boundary tracing error: {0}")]
    Tracing(String),
}

pub type Result<T> = std::result::Result<T, RegionError>;
