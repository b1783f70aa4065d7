//! Synthetic membrane predictions
//!
//! Predictions are `u8` volumes where 255 marks membrane and 0 marks cell
//! interior, so any threshold in `0..255` separates the two.

use crate::error::{TestError, TestResult};
use cubeseg_core::{Coord3, Shape3, Volume};
use std::ops::Range;

/// Prediction value of a membrane voxel
pub const MEMBRANE: u8 = 255;

/// Prediction value of a cell voxel
pub const CELL: u8 = 0;

/// Prediction built from a per-voxel membrane predicate
pub fn prediction_from<F>(shape: Shape3, is_membrane: F) -> TestResult<Volume<u8>>
where
    F: Fn(Coord3) -> bool,
{
    let data = (0..shape.len())
        .map(|i| {
            if is_membrane(shape.coord_of(i)) {
                MEMBRANE
            } else {
                CELL
            }
        })
        .collect();
    Ok(Volume::from_data(shape, data)?)
}

/// No membrane anywhere
pub fn empty_prediction(shape: Shape3) -> TestResult<Volume<u8>> {
    Ok(Volume::new(shape, CELL)?)
}

/// A box of cell voxels in the origin corner, closed off by a one-voxel wall
///
/// The interior spans `[0, interior)` on every axis; the wall covers the
/// faces at `x == interior.nx`, `y == interior.ny` and `z == interior.nz`.
/// The remaining volume is cell.
pub fn corner_cavity(shape: Shape3, interior: Shape3) -> TestResult<Volume<u8>> {
    let (ix, iy, iz) = interior.dims();
    if ix >= shape.nx || iy >= shape.ny || iz >= shape.nz {
        return Err(TestError::Fixture {
            name: "corner_cavity",
            message: format!("interior {interior} plus wall exceeds {shape}"),
        });
    }
    let (ix, iy, iz) = (ix as i64, iy as i64, iz as i64);
    prediction_from(shape, |c| {
        let inside_hull = c.x <= ix && c.y <= iy && c.z <= iz;
        inside_hull && (c.x == ix || c.y == iy || c.z == iz)
    })
}

/// Membrane slab covering the slices `z` in `slices`
pub fn membrane_slab(shape: Shape3, slices: Range<usize>) -> TestResult<Volume<u8>> {
    if slices.is_empty() || slices.end > shape.nz {
        return Err(TestError::Fixture {
            name: "membrane_slab",
            message: format!("slices {slices:?} outside of {shape}"),
        });
    }
    let (lo, hi) = (slices.start as i64, slices.end as i64);
    prediction_from(shape, |c| c.z >= lo && c.z < hi)
}

/// Membrane planes every `spacing` voxels along each axis
///
/// Planes sit at coordinates `spacing - 1`, `2 * spacing - 1`, and so on,
/// cutting the volume into cubic cells of side `spacing - 1`.
pub fn wall_grid(shape: Shape3, spacing: usize) -> TestResult<Volume<u8>> {
    if spacing < 2 {
        return Err(TestError::Fixture {
            name: "wall_grid",
            message: format!("spacing {spacing} leaves no cells"),
        });
    }
    let s = spacing as i64;
    prediction_from(shape, |c| {
        c.x % s == s - 1 || c.y % s == s - 1 || c.z % s == s - 1
    })
}
