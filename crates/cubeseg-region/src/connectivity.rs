//! Voxel neighbourhoods
//!
//! Flooding, erosion and labeling all walk the neighbours of a voxel. The
//! neighbourhood is either the 6 face-adjacent voxels or the full 26-voxel
//! cube around it.

use cubeseg_core::{Coord3, Shape3};

/// Connectivity type for neighbourhood walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityType {
    /// 6-way connectivity (shared faces)
    #[default]
    Six,
    /// 26-way connectivity (shared faces, edges and corners)
    TwentySix,
}

const FACE_OFFSETS: [Coord3; 6] = [
    Coord3::new(-1, 0, 0),
    Coord3::new(1, 0, 0),
    Coord3::new(0, -1, 0),
    Coord3::new(0, 1, 0),
    Coord3::new(0, 0, -1),
    Coord3::new(0, 0, 1),
];

impl ConnectivityType {
    /// Relative offsets of every neighbour
    pub fn offsets(self) -> Vec<Coord3> {
        match self {
            ConnectivityType::Six => FACE_OFFSETS.to_vec(),
            ConnectivityType::TwentySix => {
                let mut offsets = Vec::with_capacity(26);
                for dz in -1..=1 {
                    for dy in -1..=1 {
                        for dx in -1..=1 {
                            if (dx, dy, dz) != (0, 0, 0) {
                                offsets.push(Coord3::new(dx, dy, dz));
                            }
                        }
                    }
                }
                offsets
            }
        }
    }
}

/// Linear indices of the in-bounds neighbours of the voxel at `index`
pub(crate) fn neighbor_indices<'a>(
    shape: Shape3,
    index: usize,
    offsets: &'a [Coord3],
) -> impl Iterator<Item = usize> + 'a {
    let c = shape.coord_of(index);
    offsets.iter().filter_map(move |&d| shape.index_of(c + d))
}
