//! Seed volume

use crate::registry::{BasinId, INVALID_ID};
use cubeseg_core::{Coord3, Shape3, Volume};

/// Per-voxel seed ownership over the padded work area
///
/// A voxel holds [`INVALID_ID`] or the id of the basin seeded there. The
/// grid is only changed through [`set`](Self::set) and
/// [`clear`](Self::clear).
#[derive(Debug, Clone, PartialEq)]
pub struct SeedVolume {
    grid: Volume<u64>,
}

impl SeedVolume {
    /// Unseeded grid of the given shape
    pub fn new(shape: Shape3) -> cubeseg_core::Result<Self> {
        Ok(Self {
            grid: Volume::new(shape, INVALID_ID)?,
        })
    }

    /// Grid with `id` at every voxel where `mask` is set
    pub fn from_mask(mask: &Volume<bool>, id: BasinId) -> Self {
        Self {
            grid: mask.map(|m| if m { id } else { INVALID_ID }),
        }
    }

    pub fn shape(&self) -> Shape3 {
        self.grid.shape()
    }

    /// Seed id at a local coordinate
    pub fn get(&self, c: Coord3) -> cubeseg_core::Result<BasinId> {
        self.grid.get(c)
    }

    /// Write `id` at every listed local coordinate
    pub fn set(&mut self, coords: &[Coord3], id: BasinId) -> cubeseg_core::Result<()> {
        for &c in coords {
            self.grid.set(c, id)?;
        }
        Ok(())
    }

    /// Reset the listed voxels to unseeded
    pub fn clear(&mut self, coords: &[Coord3]) -> cubeseg_core::Result<()> {
        self.set(coords, INVALID_ID)
    }

    /// Number of seeded voxels
    pub fn seeded_count(&self) -> usize {
        self.grid.count(|&v| v != INVALID_ID)
    }

    /// The grid as a label volume
    pub fn as_volume(&self) -> &Volume<u64> {
        &self.grid
    }
}
