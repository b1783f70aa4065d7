//! Binary morphology on voxel masks

use crate::connectivity::{ConnectivityType, neighbor_indices};
use cubeseg_core::Volume;

/// Binary erosion
///
/// A voxel survives one iteration only if it and every neighbour are set.
/// Voxels outside the volume count as unset, so objects touching the border
/// erode from it too. `iterations == 0` returns a copy of the input.
///
/// # Examples
///
/// ```
/// use cubeseg_core::{Shape3, Volume};
/// use cubeseg_region::{ConnectivityType, erode_binary};
///
/// let solid = Volume::new(Shape3::cube(5), true).unwrap();
/// let eroded = erode_binary(&solid, 1, ConnectivityType::Six);
/// assert_eq!(eroded.count_true(), 27);
/// ```
pub fn erode_binary(
    input: &Volume<bool>,
    iterations: u32,
    connectivity: ConnectivityType,
) -> Volume<bool> {
    let shape = input.shape();
    let offsets = connectivity.offsets();
    let mut current = input.clone();

    for _ in 0..iterations {
        let mut next = current.clone();
        for idx in 0..current.len() {
            if !current.get_index(idx) {
                continue;
            }
            let interior = neighbor_indices(shape, idx, &offsets).count() == offsets.len();
            let keep = interior && neighbor_indices(shape, idx, &offsets).all(|n| current.get_index(n));
            if !keep {
                next.set_index(idx, false);
            }
        }
        if next == current {
            break;
        }
        current = next;
    }

    current
}
