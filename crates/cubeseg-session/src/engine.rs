//! Incremental re-segmentation
//!
//! The engine owns the grids of a session: the precomputed cost field, the
//! seed volume, the committed label volume (WS) and the active mask. Every
//! structural edit re-runs the watershed and either commits the result or
//! rolls the seed volume back, so the committed state only ever changes as a
//! whole.
//!
//! Splits are confined to the active mask: a new seed can only carve
//! territory out of the basin being edited. Extension and removal flood the
//! full volume.

use crate::error::{SessionError, SessionResult};
use crate::params::SessionParams;
use crate::registry::{BasinId, INVALID_ID, SLACK_ID, is_invalid, is_slack};
use crate::seeds::SeedVolume;
use cubeseg_core::{Coord3, Volume};
use cubeseg_region::{
    ConnectivityType, Watershed, assign_masked, count_label, distance_transform_edt,
    erode_binary, label_mask, masked_labels, relabel, scale_to_unit,
};
use std::collections::BTreeSet;
use tracing::debug;

/// Cost field and optional automatic slack seeds derived from a prediction
#[derive(Debug, Clone)]
pub struct PreparedFields {
    /// Flooding cost in `[0, 1]`; low inside cells, high on membrane
    pub cost: Volume<f64>,
    /// Voxels seeded with [`SLACK_ID`], when automatic slack is on
    pub slack_seeds: Option<Volume<bool>>,
}

/// Derive the flooding cost from a membrane prediction
///
/// Prediction values above the threshold are membrane. The volume is padded
/// by one membrane voxel so the work area border acts as a boundary. The
/// cost is the negated distance of cell voxels to the membrane, plus, with
/// automatic slack, the negated distance of membrane voxels to the cells;
/// the slack seeds are then the eroded membrane.
pub fn prepare_fields(
    prediction: &Volume<u8>,
    params: &SessionParams,
) -> SessionResult<PreparedFields> {
    let shape = prediction.shape();
    let threshold = params.membrane_threshold;
    let cell = prediction.map(|v| v <= threshold).pad(1, false);

    let mut dist = distance_transform_edt(&cell).map(|d| -d);
    let mut slack_seeds = None;

    if params.auto_slack {
        let membrane = cell.inverted();
        let outside = distance_transform_edt(&membrane);
        dist = dist.zip_map(&outside, |a, b| a - b)?;
        let eroded = erode_binary(&membrane, params.slack_erosion_iters, ConnectivityType::Six);
        slack_seeds = Some(eroded.crop(Coord3::splat(1), shape)?);
    }

    let dist = dist.crop(Coord3::splat(1), shape)?;
    Ok(PreparedFields {
        cost: scale_to_unit(&dist),
        slack_seeds,
    })
}

/// Owner of the session grids
pub struct SegmentationEngine {
    cost: Volume<f64>,
    seeds: SeedVolume,
    labels: Volume<u64>,
    mask: Volume<bool>,
    watershed: Box<dyn Watershed>,
}

impl std::fmt::Debug for SegmentationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentationEngine")
            .field("shape", &self.cost.shape())
            .field("seeded", &self.seeds.seeded_count())
            .field("masked", &self.mask.count_true())
            .finish()
    }
}

impl SegmentationEngine {
    /// Engine with nothing labeled and an all-true mask
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Configuration` if `seeds` and `cost` differ in shape.
    pub fn new(
        cost: Volume<f64>,
        seeds: SeedVolume,
        watershed: Box<dyn Watershed>,
    ) -> SessionResult<Self> {
        let shape = cost.shape();
        if seeds.shape() != shape {
            return Err(SessionError::Configuration(format!(
                "seed volume {} does not match cost field {}",
                seeds.shape(),
                shape
            )));
        }
        Ok(Self {
            labels: Volume::new(shape, INVALID_ID)?,
            mask: Volume::new(shape, true)?,
            cost,
            seeds,
            watershed,
        })
    }

    pub fn cost(&self) -> &Volume<f64> {
        &self.cost
    }

    pub fn seeds(&self) -> &SeedVolume {
        &self.seeds
    }

    /// Committed label volume
    pub fn labels(&self) -> &Volume<u64> {
        &self.labels
    }

    /// Region of the active basin
    pub fn mask(&self) -> &Volume<bool> {
        &self.mask
    }

    pub fn seed_at(&self, local: Coord3) -> SessionResult<BasinId> {
        Ok(self.seeds.get(local)?)
    }

    pub fn label_at(&self, local: Coord3) -> SessionResult<BasinId> {
        Ok(self.labels.get(local)?)
    }

    pub fn in_mask(&self, local: Coord3) -> SessionResult<bool> {
        Ok(self.mask.get(local)?)
    }

    /// Flood the current seeds, inside the active mask or over everything
    pub fn trial(&self, full: bool) -> SessionResult<Volume<u64>> {
        let seeded = self.seeds.as_volume();
        let cost = self
            .cost
            .zip_map(seeded, |c, s| if s != INVALID_ID { c - 1.0 } else { c })?;
        let everything;
        let mask = if full {
            everything = self.mask.map(|_| true);
            &everything
        } else {
            &self.mask
        };
        debug!(
            full,
            masked = mask.count_true(),
            seeded = self.seeds.seeded_count(),
            "recomputing watershed"
        );
        Ok(self.watershed.flood(&cost, seeded, mask)?)
    }

    /// Replace the labels by an unconstrained flood of the current seeds
    pub fn flood_full(&mut self) -> SessionResult<()> {
        self.labels = self.trial(true)?;
        Ok(())
    }

    /// Seed a new basin at `coords` and flood inside the active mask
    ///
    /// The split is committed only if the new basin and every ordinary basin
    /// it was carved out of keep at least `min_size` voxels. Returns the new
    /// basin's size.
    ///
    /// # Errors
    ///
    /// `SessionError::SizingViolation` for the first basin that ends up too
    /// small. On any error the seed volume and labels are left unchanged.
    pub fn try_split(
        &mut self,
        id: BasinId,
        coords: &[Coord3],
        min_size: usize,
    ) -> SessionResult<usize> {
        let mut parents = BTreeSet::new();
        for &c in coords {
            let owner = self.labels.get(c)?;
            if !is_invalid(owner) && !is_slack(owner) {
                parents.insert(owner);
            }
        }

        self.seeds.set(coords, id)?;
        let trial = match self.validate_split(id, &parents, min_size) {
            Ok(trial) => trial,
            Err(e) => {
                self.seeds.clear(coords)?;
                return Err(e);
            }
        };

        assign_masked(&mut self.labels, &trial, &self.mask)?;
        Ok(count_label(&self.labels, id))
    }

    fn validate_split(
        &self,
        id: BasinId,
        parents: &BTreeSet<BasinId>,
        min_size: usize,
    ) -> SessionResult<Volume<u64>> {
        let trial = self.trial(false)?;
        let size = count_label(&trial, id);
        if size < min_size {
            return Err(SessionError::SizingViolation {
                id,
                size,
                min_size,
                is_parent: false,
            });
        }
        for &parent in parents {
            let size = count_label(&trial, parent);
            if size < min_size {
                return Err(SessionError::SizingViolation {
                    id: parent,
                    size,
                    min_size,
                    is_parent: true,
                });
            }
        }
        Ok(trial)
    }

    /// Seed `coord` for an existing basin and flood everything
    pub fn extend(&mut self, id: BasinId, coord: Coord3) -> SessionResult<()> {
        self.seeds.set(&[coord], id)?;
        if let Err(e) = self.flood_full() {
            self.seeds.clear(&[coord])?;
            return Err(e);
        }
        Ok(())
    }

    /// Unseed `coords` and flood everything with the remaining seeds
    pub fn remove(&mut self, coords: &[Coord3]) -> SessionResult<()> {
        self.seeds.clear(coords)?;
        self.flood_full()
    }

    /// Recompute the active mask for basin `id`
    pub fn set_active(&mut self, id: BasinId) {
        self.mask = label_mask(&self.labels, id);
    }

    /// Labels inside the active mask, [`INVALID_ID`] elsewhere
    pub fn masked(&self) -> SessionResult<Volume<u64>> {
        Ok(masked_labels(&self.labels, &self.mask, INVALID_ID)?)
    }

    /// Relabel every voxel of `from` to [`SLACK_ID`]
    pub fn merge_into_slack(&mut self, from: BasinId) -> usize {
        relabel(&mut self.labels, from, SLACK_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubeseg_core::Shape3;
    use cubeseg_region::PriorityFloodWatershed;

    fn flat_engine(shape: Shape3) -> SegmentationEngine {
        SegmentationEngine::new(
            Volume::new(shape, 0.5).unwrap(),
            SeedVolume::new(shape).unwrap(),
            Box::new(PriorityFloodWatershed::default()),
        )
        .unwrap()
    }

    #[test]
    fn test_first_split_floods_everything() {
        let shape = Shape3::new(10, 1, 1);
        let mut engine = flat_engine(shape);
        let size = engine.try_split(10, &[Coord3::new(0, 0, 0)], 5).unwrap();
        assert_eq!(size, 10);
        assert_eq!(count_label(engine.labels(), 10), 10);
    }

    #[test]
    fn test_failed_split_rolls_back() {
        let shape = Shape3::new(10, 1, 1);
        let mut engine = flat_engine(shape);
        engine.try_split(10, &[Coord3::new(0, 0, 0)], 5).unwrap();
        engine.set_active(10);
        let labels = engine.labels().clone();
        let seeds = engine.seeds().clone();

        // Seeding next to the parent leaves the parent with too little room
        let err = engine.try_split(11, &[Coord3::new(1, 0, 0)], 5).unwrap_err();
        assert!(matches!(
            err,
            SessionError::SizingViolation { is_parent: true, id: 10, .. }
                | SessionError::SizingViolation { is_parent: false, id: 11, .. }
        ));
        assert_eq!(engine.labels(), &labels);
        assert_eq!(engine.seeds(), &seeds);
    }

    #[test]
    fn test_split_confined_to_mask() {
        let shape = Shape3::new(10, 1, 1);
        let mut engine = flat_engine(shape);
        engine.try_split(10, &[Coord3::new(0, 0, 0)], 1).unwrap();
        engine.set_active(10);
        engine.try_split(11, &[Coord3::new(9, 0, 0)], 1).unwrap();
        assert_eq!(count_label(engine.labels(), 10) + count_label(engine.labels(), 11), 10);

        // Only basin 11's territory is open to the next split
        engine.set_active(11);
        let before = count_label(engine.labels(), 10);
        engine.try_split(12, &[Coord3::new(8, 0, 0)], 1).unwrap();
        assert_eq!(count_label(engine.labels(), 10), before);
    }

    #[test]
    fn test_remove_reclaims() {
        let shape = Shape3::new(10, 1, 1);
        let mut engine = flat_engine(shape);
        engine.try_split(10, &[Coord3::new(0, 0, 0)], 1).unwrap();
        engine.set_active(10);
        engine.try_split(11, &[Coord3::new(9, 0, 0)], 1).unwrap();
        engine.remove(&[Coord3::new(9, 0, 0)]).unwrap();
        assert_eq!(count_label(engine.labels(), 10), 10);
        assert_eq!(engine.seeds().seeded_count(), 1);
    }

    #[test]
    fn test_select_builds_mask() {
        let shape = Shape3::new(10, 1, 1);
        let mut engine = flat_engine(shape);
        engine.try_split(10, &[Coord3::new(0, 0, 0)], 1).unwrap();
        engine.set_active(10);
        engine.try_split(11, &[Coord3::new(9, 0, 0)], 1).unwrap();
        engine.set_active(11);
        let shown = engine.masked().unwrap();
        assert_eq!(engine.mask().count_true(), count_label(engine.labels(), 11));
        assert_eq!(shown.count(|&v| v == 10), 0);
        assert_eq!(count_label(&shown, 11), engine.mask().count_true());
    }

    #[test]
    fn test_prepare_fields_without_slack() {
        let shape = Shape3::cube(6);
        let mut prediction = Volume::new(shape, 0u8).unwrap();
        prediction.set(Coord3::splat(2), 255).unwrap();
        let params = SessionParams::default().with_auto_slack(false);
        let fields = prepare_fields(&prediction, &params).unwrap();
        assert!(fields.slack_seeds.is_none());
        // Membrane is the most expensive voxel
        assert_eq!(fields.cost.get(Coord3::splat(2)).unwrap(), 1.0);
        assert!(fields.cost.data().iter().all(|&c| (0.0..=1.0).contains(&c)));
    }

    #[test]
    fn test_prepare_fields_slack_seeds() {
        // Membrane slab three voxels thick across z
        let shape = Shape3::new(5, 5, 9);
        let mut prediction = Volume::new(shape, 0u8).unwrap();
        for z in 3..6 {
            for y in 0..5 {
                for x in 0..5 {
                    prediction.set(Coord3::new(x, y, z), 200).unwrap();
                }
            }
        }
        let params = SessionParams::default().with_auto_slack(true);
        let fields = prepare_fields(&prediction, &params).unwrap();
        let slack = fields.slack_seeds.unwrap();
        // Only the middle plane survives one erosion
        assert_eq!(slack.count_true(), 25);
        assert!(slack.get(Coord3::new(0, 0, 4)).unwrap());
        assert!(!slack.get(Coord3::new(0, 0, 3)).unwrap());

        let none = prepare_fields(&prediction, &params.clone().with_slack_erosion_iters(0)).unwrap();
        assert_eq!(none.slack_seeds.unwrap().count_true(), 75);
    }
}
