//! Error types for cubeseg-session
//!
//! Every rejected command is reported through [`SessionError`]. All variants
//! except [`SessionError::InvariantBroken`] and [`SessionError::Aborted`]
//! leave the session usable and its committed state untouched.

use crate::host::HostError;
use crate::registry::BasinId;
use cubeseg_core::Coord3;
use cubeseg_region::RegionError;
use thiserror::Error;

/// Why a clicked voxel cannot be used for a new seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// The voxel already carries a seed
    AlreadySeeded,
    /// The voxel lies outside the active basin
    OutsideActiveBasin,
}

/// Errors that can occur during a basin session
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    /// A split would leave the new or a parent basin too small
    #[error(
        "{} object {id} would have {size} voxels, below the minimum of {min_size}",
        role(.is_parent)
    )]
    SizingViolation {
        id: BasinId,
        size: usize,
        min_size: usize,
        is_parent: bool,
    },

    /// The clicked voxel belongs to another basin
    #[error("voxel {coord} is owned by object {owner} ({kind:?})")]
    OwnershipConflict {
        coord: Coord3,
        owner: BasinId,
        kind: ConflictKind,
    },

    /// The command is not allowed in the current state
    #[error("illegal operation: {0}")]
    IllegalOperation(String),

    /// Malformed session parameters or inputs
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The background loader did not finish in time
    #[error("loader still busy after {polls} polls")]
    Stall { polls: u32 },

    /// A loader wait was cancelled
    #[error("loader wait cancelled")]
    Cancelled,

    /// No basin with this id exists
    #[error("unknown object {0}")]
    UnknownBasin(BasinId),

    /// The coordinate lies outside the padded work area
    #[error("coordinate {0} outside of the work area")]
    OutOfWorkArea(Coord3),

    /// Internal bookkeeping disagrees; the session must be reset
    #[error("session invariant broken: {0}")]
    InvariantBroken(String),

    /// The session was aborted by an earlier invariant break
    #[error("session aborted, only reset is possible")]
    Aborted,

    /// Host collaborator failure
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// Region processing failure
    #[error("region error: {0}")]
    Region(#[from] RegionError),

    /// Core library failure
    #[error("core error: {0}")]
    Core(#[from] cubeseg_core::Error),
}

fn role(is_parent: &bool) -> &'static str {
    if *is_parent { "parent" } else { "new" }
}

impl SessionError {
    /// Whether the session can keep going after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            SessionError::InvariantBroken(_) | SessionError::Aborted
        )
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
