//! Cubeseg Core - Basic data structures for voxel segmentation
//!
//! This crate provides the fundamental data structures used throughout
//! the cubeseg workspace:
//!
//! - [`Coord3`] - Voxel coordinate (absolute or volume-local)
//! - [`Shape3`] - Extent of a rectangular voxel block
//! - [`Volume`] - Dense 3-D grid of labels, masks or scalar fields

pub mod coord;
pub mod error;
pub mod volume;

pub use coord::{Coord3, Shape3};
pub use error::{Error, Result};
pub use volume::Volume;
