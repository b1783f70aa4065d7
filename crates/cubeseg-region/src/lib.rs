//! cubeseg-region - Region processing for voxel segmentation
//!
//! This crate provides the volume-level primitives the basin session
//! builds on:
//!
//! - **Watershed segmentation** - Seeded priority flooding over a cost field
//! - **Distance transforms** - Exact Euclidean distance to background
//! - **Binary morphology** - Erosion of voxel masks
//! - **Label statistics** - Counting, relabeling and masking label volumes
//!
//! # Examples
//!
//! ## Watershed segmentation
//!
//! ```
//! use cubeseg_core::{Coord3, Shape3, Volume};
//! use cubeseg_region::{PriorityFloodWatershed, Watershed, WatershedOptions};
//!
//! let shape = Shape3::cube(8);
//! let cost = Volume::new(shape, 0.0).unwrap();
//! let mask = Volume::new(shape, true).unwrap();
//! let mut seeds = Volume::new(shape, 0u64).unwrap();
//! seeds.set(Coord3::splat(0), 5).unwrap();
//!
//! let ws = PriorityFloodWatershed::new(WatershedOptions::default());
//! let labels = ws.flood(&cost, &seeds, &mask).unwrap();
//! assert_eq!(labels.count(|&v| v == 5), shape.len());
//! ```
//!
//! ## Distance-based cost field
//!
//! ```
//! use cubeseg_core::{Shape3, Volume};
//! use cubeseg_region::{distance_transform_edt, scale_to_unit};
//!
//! let cells = Volume::new(Shape3::cube(4), true).unwrap();
//! let cost = scale_to_unit(&distance_transform_edt(&cells));
//! assert!(cost.data().iter().all(|&v| (0.0..=1.0).contains(&v)));
//! ```

pub mod connectivity;
pub mod distance;
pub mod error;
pub mod label;
pub mod morph;
pub mod watershed;

// Re-export core types
pub use cubeseg_core;

// Re-export error types
pub use error::{RegionError, RegionResult};

pub use connectivity::ConnectivityType;

// Re-export distance functions
pub use distance::{distance_transform_edt, scale_to_unit};

// Re-export label functions
pub use label::{assign_masked, count_label, label_mask, label_sizes, masked_labels, relabel};

pub use morph::erode_binary;

// Re-export watershed types
pub use watershed::{PriorityFloodWatershed, UNLABELED, Watershed, WatershedOptions};
