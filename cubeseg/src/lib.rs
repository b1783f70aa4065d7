//! Cubeseg - Interactive watershed decomposition of labeled 3-D volumes
//!
//! # Overview
//!
//! An operator splits a labeled work area into sub-objects by clicking
//! seeds. Each edit re-floods a cost field derived from a membrane
//! prediction, and splits that would leave an object below a minimum size
//! are rejected. Objects move between a Pending and a Done list until the
//! result is written back to the dataset.
//!
//! - [`region`] - Watershed flooding, distance transforms, erosion, label statistics
//! - [`session`] - Basin registry, segmentation engine, workflow and lifecycle
//!
//! The embedding application provides the dataset, the annotation skeleton
//! and the viewport by implementing [`session::Host`].
//!
//! # Example
//!
//! ```
//! use cubeseg::{Coord3, Shape3, Volume};
//! use cubeseg::region::{PriorityFloodWatershed, Watershed, count_label};
//!
//! let shape = Shape3::cube(8);
//! let cost = Volume::new(shape, 0.0).unwrap();
//! let mut seeds = Volume::new(shape, 0u64).unwrap();
//! seeds.set(Coord3::splat(4), 10).unwrap();
//! let mask = Volume::new(shape, true).unwrap();
//!
//! let labels = PriorityFloodWatershed::default().flood(&cost, &seeds, &mask).unwrap();
//! assert_eq!(count_label(&labels, 10), 512);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use cubeseg_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use cubeseg_region as region;
pub use cubeseg_session as session;
