//! Host collaborator contracts
//!
//! A session never owns the labeled dataset, the annotation skeleton or the
//! viewport. It reaches them through these traits, which the embedding
//! application implements. All coordinates here are absolute dataset
//! coordinates.

use cubeseg_core::{Coord3, Shape3, Volume};
use thiserror::Error;

/// Handle of an annotation tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(pub u64);

/// Handle of an annotation node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Failures reported by host collaborators
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The requested block exceeds what the store can address at once
    #[error("region of {requested} voxels exceeds the limit of {limit}")]
    RegionTooLarge { requested: usize, limit: usize },

    /// The requested block is not inside the dataset
    #[error("region {shape} at {origin} is outside of the dataset")]
    OutOfBounds { origin: Coord3, shape: Shape3 },

    /// Any other refusal
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Result type for host calls
pub type HostResult<T> = Result<T, HostError>;

/// Block access to the labeled dataset
pub trait VoxelRegion {
    /// Read the labels of the block starting at `origin`
    fn read(&mut self, origin: Coord3, shape: Shape3) -> HostResult<Volume<u64>>;

    /// Overwrite the block starting at `origin` with `labels`
    fn write(&mut self, origin: Coord3, labels: &Volume<u64>) -> HostResult<()>;

    /// Confine navigation to the inclusive box `[begin, end]`
    fn set_movement_area(&mut self, begin: Coord3, end: Coord3);

    /// Lift the navigation confinement
    fn reset_movement_area(&mut self);
}

/// Skeleton annotations used as seed markers and object tags
pub trait Annotations {
    fn add_tree(&mut self) -> HostResult<TreeId>;

    fn delete_tree(&mut self, tree: TreeId) -> HostResult<()>;

    fn add_node(&mut self, coord: Coord3, tree: TreeId, radius: f64) -> HostResult<NodeId>;

    fn delete_node(&mut self, node: NodeId) -> HostResult<()>;

    fn set_active_node(&mut self, node: NodeId) -> HostResult<()>;

    /// Persist a comment on the object formed by `basin`
    fn tag_object(&mut self, basin: u64, coord: Coord3, comment: &str) -> HostResult<()>;
}

/// Viewport position and background loading state
pub trait Navigator {
    fn position(&self) -> Coord3;

    fn set_position(&mut self, coord: Coord3);

    /// Whether the data around the current position is fully loaded
    fn is_loader_finished(&self) -> bool;
}

/// Everything a session needs from its host
pub trait Host: VoxelRegion + Annotations + Navigator {}

impl<T: VoxelRegion + Annotations + Navigator + ?Sized> Host for T {}
