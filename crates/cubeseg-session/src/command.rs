//! Session commands and their results

use crate::registry::BasinId;
use crate::workflow::WorkflowPartition;
use cubeseg_core::Coord3;

/// One operator action
///
/// Coordinates are absolute dataset coordinates, as reported by the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Split a new basin off the active one at `coord`, together with any staged subseeds
    AddSeed { coord: Coord3, slack: bool },
    /// Stage an extra seed voxel for the next `AddSeed`
    StageSubseed { coord: Coord3 },
    /// Drop all staged subseeds
    ResetSubseeds,
    /// Claim the voxel at `coord` (outside the active basin) for the active basin
    Extend { coord: Coord3 },
    /// Delete basins and re-flood
    RemoveSeeds { ids: Vec<BasinId> },
    /// Delete the most recently created basin
    UndoLast,
    /// Make a pending basin the active one
    SelectBasin { id: BasinId },
    /// Move the viewport to a done basin without activating it
    NavigateDone { id: BasinId },
    /// Move a basin between Pending and Done
    ToggleDone { id: BasinId },
    /// Flip the slack classification
    ToggleSlack { ids: Vec<BasinId> },
    /// Flip the advisory to-do flag
    ToggleTodo { ids: Vec<BasinId> },
}

impl Command {
    /// Whether the command changes seeds or labels
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Command::AddSeed { .. }
                | Command::Extend { .. }
                | Command::RemoveSeeds { .. }
                | Command::UndoLast
        )
    }
}

/// Result of a successfully executed command
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A new basin was committed with `size` voxels
    Created { id: BasinId, size: usize },
    /// `count` subseeds are now staged
    Staged { count: usize },
    /// Staging was dropped
    StagingCleared { discarded: usize },
    Extended { id: BasinId },
    /// Basins were deleted; `active` is the basin active afterwards
    Removed { ids: Vec<BasinId>, active: BasinId },
    Selected { id: BasinId },
    Navigated { id: BasinId },
    Moved { id: BasinId, to: WorkflowPartition },
    Reclassified { ids: Vec<BasinId> },
}
