//! Label volume statistics and rewriting
//!
//! Helpers over `Volume<u64>` label volumes, where each voxel carries the id
//! of the object it belongs to and `0` marks unassigned voxels.

use crate::error::{RegionError, RegionResult};
use std::collections::BTreeMap;
use cubeseg_core::Volume;

/// Number of voxels carrying `label`
pub fn count_label(labels: &Volume<u64>, label: u64) -> usize {
    labels.count(|&v| v == label)
}

/// Voxel count of every label present, including `0`
pub fn label_sizes(labels: &Volume<u64>) -> BTreeMap<u64, usize> {
    let mut sizes = BTreeMap::new();
    for &v in labels.data() {
        *sizes.entry(v).or_insert(0) += 1;
    }
    sizes
}

/// Rewrite every `from` voxel to `to`, returning how many changed
pub fn relabel(labels: &mut Volume<u64>, from: u64, to: u64) -> usize {
    if from == to {
        return 0;
    }
    let mut changed = 0;
    for v in labels.data_mut() {
        if *v == from {
            *v = to;
            changed += 1;
        }
    }
    changed
}

/// Boolean mask of the voxels carrying `label`
pub fn label_mask(labels: &Volume<u64>, label: u64) -> Volume<bool> {
    labels.map(|v| v == label)
}

/// Keep labels where `mask` is set, `background` elsewhere
///
/// # Errors
///
/// Returns `RegionError::ShapeMismatch` if the shapes differ.
pub fn masked_labels(
    labels: &Volume<u64>,
    mask: &Volume<bool>,
    background: u64,
) -> RegionResult<Volume<u64>> {
    if labels.shape() != mask.shape() {
        return Err(RegionError::ShapeMismatch {
            what: "mask",
            expected: labels.shape(),
            actual: mask.shape(),
        });
    }
    Ok(labels.zip_map(mask, |v, keep| if keep { v } else { background })?)
}

/// Copy `src` into `dst` wherever `mask` is set
///
/// # Errors
///
/// Returns `RegionError::ShapeMismatch` if the shapes differ.
pub fn assign_masked(
    dst: &mut Volume<u64>,
    src: &Volume<u64>,
    mask: &Volume<bool>,
) -> RegionResult<()> {
    for (what, shape) in [("source", src.shape()), ("mask", mask.shape())] {
        if shape != dst.shape() {
            return Err(RegionError::ShapeMismatch {
                what,
                expected: dst.shape(),
                actual: shape,
            });
        }
    }
    for ((d, &s), &m) in dst.data_mut().iter_mut().zip(src.data()).zip(mask.data()) {
        if m {
            *d = s;
        }
    }
    Ok(())
}
