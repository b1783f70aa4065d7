//! Error types for cubeseg-core
//!
//! Provides a unified error type for all operations in the core crate.
//! Each variant captures enough context for diagnostics without exposing
//! internal implementation details.

use thiserror::Error;

/// Cubeseg core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid volume dimensions
    #[error("invalid volume dimensions: {nx}x{ny}x{nz}")]
    InvalidDimension { nx: usize, ny: usize, nz: usize },

    /// Index out of bounds
    #[error("index out of bounds: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Coordinate outside of the volume
    #[error("coordinate ({x}, {y}, {z}) outside of volume")]
    CoordOutOfBounds { x: i64, y: i64, z: i64 },

    /// Volume dimension mismatch
    #[error("dimension mismatch: expected {}x{}x{}, got {}x{}x{}", .expected.0, .expected.1, .expected.2, .actual.0, .actual.1, .actual.2)]
    DimensionMismatch {
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Malformed coordinate or size text
    #[error("cannot parse '{0}' as a voxel triple")]
    ParseCoord(String),
}

/// Result type alias for cubeseg core operations
pub type Result<T> = std::result::Result<T, Error>;
