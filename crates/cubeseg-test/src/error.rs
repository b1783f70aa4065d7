//! Error types for the test framework

use thiserror::Error;

/// Errors that can occur while setting up regression tests
#[derive(Debug, Error)]
pub enum TestError {
    /// Fixture geometry does not fit the requested volume
    #[error("fixture {name} does not fit: {message}")]
    Fixture { name: &'static str, message: String },

    /// Value comparison failed
    #[error(
        "value comparison failed at index {index}: expected {expected}, got {actual}, delta {delta}"
    )]
    ValueMismatch {
        index: usize,
        expected: f64,
        actual: f64,
        delta: f64,
    },

    /// Volume comparison failed
    #[error("volume comparison failed at index {index}: {message}")]
    VolumeMismatch { index: usize, message: String },

    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] cubeseg_core::Error),
}

/// Result type for test operations
pub type TestResult<T> = Result<T, TestError>;
