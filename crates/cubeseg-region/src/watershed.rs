//! Seeded watershed flooding
//!
//! The watershed treats a cost field as a topographic surface. Every seed
//! label floods outward from its seed voxels; a voxel is claimed by the
//! first basin whose flood front reaches it, with fronts always advancing
//! through the cheapest voxel available anywhere in the volume.
//!
//! [`Watershed`] is the contract the session engine depends on.
//! [`PriorityFloodWatershed`] is the reference implementation.

use crate::connectivity::{ConnectivityType, neighbor_indices};
use crate::error::{RegionError, RegionResult};
use cubeseg_core::Volume;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::trace;

/// Label of voxels that no basin reached
pub const UNLABELED: u64 = 0;

/// Marker-based watershed flooding
///
/// Implementations must be deterministic for identical inputs. Every masked
/// voxel reachable from at least one seed (through masked voxels) receives
/// the label of some seed; unmasked voxels and unreachable masked voxels stay
/// [`UNLABELED`]. How ties between equally cheap fronts are resolved is up to
/// the implementation.
pub trait Watershed {
    /// Flood `seeds` over `cost`, restricted to voxels where `mask` is true
    fn flood(
        &self,
        cost: &Volume<f64>,
        seeds: &Volume<u64>,
        mask: &Volume<bool>,
    ) -> RegionResult<Volume<u64>>;
}

/// Options for watershed flooding
#[derive(Debug, Clone)]
pub struct WatershedOptions {
    /// Connectivity type for finding neighbors
    pub connectivity: ConnectivityType,
}

impl Default for WatershedOptions {
    fn default() -> Self {
        Self {
            connectivity: ConnectivityType::Six,
        }
    }
}

impl WatershedOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set connectivity type
    pub fn with_connectivity(mut self, connectivity: ConnectivityType) -> Self {
        self.connectivity = connectivity;
        self
    }
}

/// Heap entry of the priority flood
#[derive(Debug, Clone, Copy)]
struct FloodEntry {
    cost: f64,
    age: u64,
    index: usize,
}

impl PartialEq for FloodEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloodEntry {}

impl PartialOrd for FloodEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloodEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap pops the largest entry
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.age.cmp(&self.age))
    }
}

/// Priority-flood watershed
///
/// Voxels are labeled when they are first pushed onto a min-heap ordered by
/// `(cost, insertion age)`, so among equal costs the earlier front wins.
#[derive(Debug, Clone, Default)]
pub struct PriorityFloodWatershed {
    options: WatershedOptions,
}

impl PriorityFloodWatershed {
    /// Create a watershed with the given options
    pub fn new(options: WatershedOptions) -> Self {
        Self { options }
    }

    /// The options this watershed was built with
    pub fn options(&self) -> &WatershedOptions {
        &self.options
    }
}

impl Watershed for PriorityFloodWatershed {
    fn flood(
        &self,
        cost: &Volume<f64>,
        seeds: &Volume<u64>,
        mask: &Volume<bool>,
    ) -> RegionResult<Volume<u64>> {
        let shape = cost.shape();
        if seeds.shape() != shape {
            return Err(RegionError::ShapeMismatch {
                what: "seed volume",
                expected: shape,
                actual: seeds.shape(),
            });
        }
        if mask.shape() != shape {
            return Err(RegionError::ShapeMismatch {
                what: "mask",
                expected: shape,
                actual: mask.shape(),
            });
        }

        let offsets = self.options.connectivity.offsets();
        let mut labels = Volume::new(shape, UNLABELED)?;
        let mut queue = BinaryHeap::new();
        let mut age = 0u64;

        for (idx, (&seed, &inside)) in seeds.data().iter().zip(mask.data()).enumerate() {
            if seed != UNLABELED && inside {
                labels.set_index(idx, seed);
                queue.push(FloodEntry {
                    cost: cost.get_index(idx),
                    age,
                    index: idx,
                });
                age += 1;
            }
        }

        trace!(seeds = age, %shape, "priority flood seeded");

        while let Some(FloodEntry { index: idx, .. }) = queue.pop() {
            let label = labels.get_index(idx);
            for n in neighbor_indices(shape, idx, &offsets) {
                if !mask.get_index(n) || labels.get_index(n) != UNLABELED {
                    continue;
                }
                labels.set_index(n, label);
                queue.push(FloodEntry {
                    cost: cost.get_index(n),
                    age,
                    index: n,
                });
                age += 1;
            }
        }

        Ok(labels)
    }
}
