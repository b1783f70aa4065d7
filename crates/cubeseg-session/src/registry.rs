//! Basin records and id allocation

use crate::host::{NodeId, TreeId};
use crate::workflow::WorkflowPartition;
use cubeseg_core::Coord3;
use std::collections::{BTreeMap, HashMap};

/// Basin identifier, also the label value basins carry in label volumes
pub type BasinId = u64;

/// Label of voxels that belong to no basin
pub const INVALID_ID: BasinId = 0;

/// Label every slack basin is merged into at finish
pub const SLACK_ID: BasinId = 1;

pub fn is_invalid(id: BasinId) -> bool {
    id == INVALID_ID
}

pub fn is_slack(id: BasinId) -> bool {
    id == SLACK_ID
}

/// Neither of the reserved ids
///
/// This is independent of [`Classification`], which records whether the
/// operator wants the basin merged into slack later.
pub fn is_ordinary(id: BasinId) -> bool {
    !(is_invalid(id) || is_slack(id))
}

/// Operator's intent for a basin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Classification {
    #[default]
    Ordinary,
    /// Merged into [`SLACK_ID`] at finish
    Slack,
}

impl Classification {
    pub fn toggled(self) -> Self {
        match self {
            Classification::Ordinary => Classification::Slack,
            Classification::Slack => Classification::Ordinary,
        }
    }
}

/// One segmentation unit
#[derive(Debug, Clone, PartialEq)]
pub struct Basin {
    pub id: BasinId,
    /// Canonical position, absolute; [`Coord3::SENTINEL`] for the automatic slack basin
    pub primary_seed: Coord3,
    /// Further seed voxels committed with the primary seed or added by extension
    pub subseeds: Vec<Coord3>,
    pub classification: Classification,
    pub state: WorkflowPartition,
    /// Advisory marker, no effect on segmentation
    pub todo: bool,
    pub tree: Option<TreeId>,
    pub node: Option<NodeId>,
}

impl Basin {
    /// New pending basin seeded at `primary_seed`
    pub fn new(id: BasinId, primary_seed: Coord3) -> Self {
        Self {
            id,
            primary_seed,
            subseeds: Vec::new(),
            classification: Classification::Ordinary,
            state: WorkflowPartition::Pending,
            todo: false,
            tree: None,
            node: None,
        }
    }

    /// Primary seed followed by the subseeds
    pub fn seeds(&self) -> impl Iterator<Item = Coord3> + '_ {
        std::iter::once(self.primary_seed).chain(self.subseeds.iter().copied())
    }

    /// Whether the operator marked this basin as slack
    pub fn is_slack_classified(&self) -> bool {
        self.classification == Classification::Slack
    }
}

/// Authoritative map of live basins
#[derive(Debug, Clone, PartialEq)]
pub struct BasinRegistry {
    base_id: BasinId,
    high_water: BasinId,
    basins: BTreeMap<BasinId, Basin>,
    by_coord: HashMap<Coord3, BasinId>,
}

impl BasinRegistry {
    /// Empty registry allocating ids from `base_id` upwards
    pub fn new(base_id: BasinId) -> Self {
        Self {
            base_id,
            high_water: INVALID_ID,
            basins: BTreeMap::new(),
            by_coord: HashMap::new(),
        }
    }

    /// Id the next inserted basin should get
    ///
    /// Never returns an id that was inserted before, even if that basin has
    /// since been removed. Nothing is reserved until [`insert`](Self::insert).
    pub fn allocate_id(&self) -> BasinId {
        let live_max = self.basins.keys().next_back().copied().unwrap_or(INVALID_ID);
        live_max
            .max(self.high_water)
            .max(self.base_id.saturating_sub(1))
            + 1
    }

    /// Insert or replace a basin record
    pub fn insert(&mut self, basin: Basin) {
        self.remove(basin.id);
        self.high_water = self.high_water.max(basin.id);
        self.by_coord.insert(basin.primary_seed, basin.id);
        self.basins.insert(basin.id, basin);
    }

    /// Remove a basin record
    pub fn remove(&mut self, id: BasinId) -> Option<Basin> {
        let basin = self.basins.remove(&id)?;
        if self.by_coord.get(&basin.primary_seed) == Some(&id) {
            self.by_coord.remove(&basin.primary_seed);
        }
        Some(basin)
    }

    pub fn get(&self, id: BasinId) -> Option<&Basin> {
        self.basins.get(&id)
    }

    pub fn get_mut(&mut self, id: BasinId) -> Option<&mut Basin> {
        self.basins.get_mut(&id)
    }

    pub fn contains(&self, id: BasinId) -> bool {
        self.basins.contains_key(&id)
    }

    /// Basin whose primary seed is at `coord`
    pub fn owner_of(&self, coord: Coord3) -> Option<BasinId> {
        self.by_coord.get(&coord).copied()
    }

    pub fn len(&self) -> usize {
        self.basins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.basins.is_empty()
    }

    /// Live basins in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Basin> {
        self.basins.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = BasinId> + '_ {
        self.basins.keys().copied()
    }

    /// Ids of the basins in one partition
    pub fn ids_in(&self, partition: WorkflowPartition) -> Vec<BasinId> {
        self.basins
            .values()
            .filter(|b| b.state == partition)
            .map(|b| b.id)
            .collect()
    }
}
