//! Watershed flooding regression test
//!
//! Floods synthetic cost fields with the priority-flood watershed and checks
//! where the basin boundaries land:
//! 1. Two seeds separated by a cost ridge
//! 2. Mask confinement and unreachable voxels
//! 3. Six versus twenty-six connectivity
//! 4. Determinism and the seeded-cost offset the session engine relies on
//!
//! Run with:
//! ```
//! cargo test -p cubeseg-region --test watershed_reg
//! ```

use cubeseg_core::{Coord3, Shape3, Volume};
use cubeseg_region::{
    ConnectivityType, PriorityFloodWatershed, RegionError, UNLABELED, Watershed,
    WatershedOptions, count_label, label_sizes,
};
use cubeseg_test::RegParams;

/// Cost 1.0 on the plane `x == ridge`, 0.0 elsewhere
fn ridge_cost(shape: Shape3, ridge: i64) -> Volume<f64> {
    let data = (0..shape.len())
        .map(|i| if shape.coord_of(i).x == ridge { 1.0 } else { 0.0 })
        .collect();
    Volume::from_data(shape, data).unwrap()
}

fn seed_volume(shape: Shape3, seeds: &[(Coord3, u64)]) -> Volume<u64> {
    let mut vol = Volume::new(shape, UNLABELED).unwrap();
    for &(c, label) in seeds {
        vol.set(c, label).unwrap();
    }
    vol
}

#[test]
fn watershed_ridge_split() {
    let mut rp = RegParams::new("watershed");

    let shape = Shape3::cube(20);
    let cost = ridge_cost(shape, 10);
    let seeds = seed_volume(
        shape,
        &[(Coord3::new(2, 10, 10), 3), (Coord3::new(17, 10, 10), 4)],
    );
    let mask = Volume::new(shape, true).unwrap();
    let labels = PriorityFloodWatershed::default()
        .flood(&cost, &seeds, &mask)
        .unwrap();

    // Everything is reached
    rp.compare_values(0.0, count_label(&labels, UNLABELED) as f64, 0.0);

    // Each side of the ridge belongs to its own seed
    let mut left_ok = true;
    let mut right_ok = true;
    for i in 0..shape.len() {
        let c = shape.coord_of(i);
        let label = labels.get_index(i);
        if c.x < 10 && label != 3 {
            left_ok = false;
        }
        if c.x > 10 && label != 4 {
            right_ok = false;
        }
    }
    rp.check(left_ok, "left of ridge is basin 3");
    rp.check(right_ok, "right of ridge is basin 4");

    // The ridge itself is shared between the two
    let sizes = label_sizes(&labels);
    rp.compare_values(2.0, sizes.len() as f64, 0.0);
    let left = sizes.get(&3).copied().unwrap_or(0);
    let right = sizes.get(&4).copied().unwrap_or(0);
    rp.compare_values(8000.0, (left + right) as f64, 0.0);
    rp.check(left >= 4000 && right >= 3600, "ridge voxels split between basins");

    assert!(rp.cleanup(), "watershed regression test failed");
}

#[test]
fn watershed_mask_confinement() {
    let mut rp = RegParams::new("watershed_mask");

    // A wall of unmasked voxels at z == 4 cuts the volume in two
    let shape = Shape3::new(6, 6, 10);
    let cost = Volume::new(shape, 0.5).unwrap();
    let seeds = seed_volume(shape, &[(Coord3::new(1, 1, 1), 11)]);
    let mask = Volume::from_data(
        shape,
        (0..shape.len()).map(|i| shape.coord_of(i).z != 4).collect(),
    )
    .unwrap();

    let labels = PriorityFloodWatershed::default()
        .flood(&cost, &seeds, &mask)
        .unwrap();
    rp.compare_values(144.0, count_label(&labels, 11) as f64, 0.0);
    rp.compare_values(216.0, count_label(&labels, UNLABELED) as f64, 0.0);
    rp.compare_values(
        UNLABELED as f64,
        labels.get(Coord3::new(3, 3, 8)).unwrap() as f64,
        0.0,
    );

    // A second seed beyond the wall claims the far side
    let seeds = seed_volume(
        shape,
        &[(Coord3::new(1, 1, 1), 11), (Coord3::new(1, 1, 8), 12)],
    );
    let labels = PriorityFloodWatershed::default()
        .flood(&cost, &seeds, &mask)
        .unwrap();
    rp.compare_values(180.0, count_label(&labels, 12) as f64, 0.0);
    rp.compare_values(36.0, count_label(&labels, UNLABELED) as f64, 0.0);

    assert!(rp.cleanup(), "watershed mask test failed");
}

#[test]
fn watershed_connectivity() {
    let mut rp = RegParams::new("watershed_connectivity");

    // Diagonal chain of masked voxels: only corners touch
    let shape = Shape3::cube(5);
    let mut mask = Volume::new(shape, false).unwrap();
    for i in 0..5 {
        mask.set(Coord3::splat(i), true).unwrap();
    }
    let cost = Volume::new(shape, 0.0).unwrap();
    let seeds = seed_volume(shape, &[(Coord3::splat(0), 5)]);

    let six = PriorityFloodWatershed::new(
        WatershedOptions::new().with_connectivity(ConnectivityType::Six),
    );
    let all = PriorityFloodWatershed::new(
        WatershedOptions::new().with_connectivity(ConnectivityType::TwentySix),
    );
    rp.compare_values(
        1.0,
        count_label(&six.flood(&cost, &seeds, &mask).unwrap(), 5) as f64,
        0.0,
    );
    rp.compare_values(
        5.0,
        count_label(&all.flood(&cost, &seeds, &mask).unwrap(), 5) as f64,
        0.0,
    );
    rp.check(
        all.options().connectivity == ConnectivityType::TwentySix,
        "options are kept",
    );

    assert!(rp.cleanup(), "watershed connectivity test failed");
}

#[test]
fn watershed_determinism_and_seed_offset() {
    let mut rp = RegParams::new("watershed_determinism");

    // Sloped cost: uphill along x
    let shape = Shape3::new(12, 4, 4);
    let cost = Volume::from_data(
        shape,
        (0..shape.len())
            .map(|i| shape.coord_of(i).x as f64 / 11.0)
            .collect(),
    )
    .unwrap();
    let seeds = seed_volume(
        shape,
        &[(Coord3::new(0, 0, 0), 1), (Coord3::new(11, 3, 3), 2)],
    );
    let mask = Volume::new(shape, true).unwrap();
    let ws = PriorityFloodWatershed::default();

    let first = ws.flood(&cost, &seeds, &mask).unwrap();
    let second = ws.flood(&cost, &seeds, &mask).unwrap();
    rp.compare_volumes(&first, &second);

    // Lowering seeded voxels below the field keeps every seed on its own label
    let offset = cost
        .zip_map(&seeds, |c, s| if s != UNLABELED { c - 1.0 } else { c })
        .unwrap();
    let labels = ws.flood(&offset, &seeds, &mask).unwrap();
    rp.compare_values(1.0, labels.get(Coord3::new(0, 0, 0)).unwrap() as f64, 0.0);
    rp.compare_values(2.0, labels.get(Coord3::new(11, 3, 3)).unwrap() as f64, 0.0);
    rp.compare_values(0.0, count_label(&labels, UNLABELED) as f64, 0.0);

    assert!(rp.cleanup(), "watershed determinism test failed");
}

#[test]
fn watershed_error_handling() {
    let mut rp = RegParams::new("watershed_errors");

    let cost = Volume::new(Shape3::cube(4), 0.0).unwrap();
    let seeds = Volume::new(Shape3::cube(4), UNLABELED).unwrap();
    let mask = Volume::new(Shape3::new(4, 4, 5), true).unwrap();
    let result = PriorityFloodWatershed::default().flood(&cost, &seeds, &mask);
    rp.check(
        matches!(result, Err(RegionError::ShapeMismatch { what: "mask", .. })),
        "mask of the wrong shape is rejected",
    );

    // No seeds: nothing is labeled
    let mask = Volume::new(Shape3::cube(4), true).unwrap();
    let labels = PriorityFloodWatershed::default()
        .flood(&cost, &seeds, &mask)
        .unwrap();
    rp.compare_values(64.0, count_label(&labels, UNLABELED) as f64, 0.0);

    assert!(rp.cleanup(), "watershed error handling test failed");
}
