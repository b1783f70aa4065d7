//! cubeseg-session - Interactive basin session engine
//!
//! An operator decomposes a labeled work area into sub-objects by placing
//! seeds. After every edit the session re-floods the affected region,
//! rejects splits that would leave a basin too small, and keeps every basin
//! in exactly one of two workflow partitions, Pending or Done.
//!
//! - [`Session`] - Lifecycle and command execution
//! - [`SegmentationEngine`] - Cost field, seeds, labels and active mask
//! - [`BasinRegistry`] - Basin records and id allocation
//! - [`Workflow`] - Pending/Done focus stacks
//! - [`host`] - Traits the embedding application implements
//!
//! # Examples
//!
//! ```ignore
//! use cubeseg_session::{Command, Session, SessionParams, WorkArea};
//!
//! let params = SessionParams::new(WorkArea::new(begin, size)).with_min_object_size(100);
//! let mut session = Session::begin(&mut host, &prediction, params)?;
//! session.execute(Command::AddSeed { coord: center, slack: false })?;
//! session.execute(Command::ToggleDone { id: session.active_id() })?;
//! let report = session.finish()?;
//! assert!(report.ready);
//! ```

pub mod command;
pub mod engine;
pub mod error;
pub mod host;
pub mod loader;
pub mod params;
pub mod registry;
pub mod seeds;
pub mod session;
pub mod workflow;

// Re-export error types
pub use error::{ConflictKind, SessionError, SessionResult};

pub use command::{Command, Outcome};
pub use engine::{PreparedFields, SegmentationEngine, prepare_fields};
pub use host::{Annotations, Host, HostError, HostResult, Navigator, NodeId, TreeId, VoxelRegion};
pub use loader::{CancelToken, WaitPolicy, wait_for_loader};
pub use params::{FinishMode, SessionParams, WorkArea};
pub use registry::{
    Basin, BasinId, BasinRegistry, Classification, INVALID_ID, SLACK_ID, is_invalid, is_ordinary,
    is_slack,
};
pub use seeds::SeedVolume;
pub use session::{FinishReport, Session, TableRow};
pub use workflow::{PartitionState, Workflow, WorkflowPartition};
