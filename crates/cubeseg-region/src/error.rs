//! Error types for cubeseg-region

use thiserror::Error;

/// Errors that can occur during region processing operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegionError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] cubeseg_core::Error),

    /// Input volumes disagree in shape
    #[error("shape mismatch: {what} is {actual}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: cubeseg_core::Shape3,
        actual: cubeseg_core::Shape3,
    },

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for region operations
pub type RegionResult<T> = Result<T, RegionError>;
