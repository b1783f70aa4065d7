//! Session configuration
//!
//! [`SessionParams`] follows the options-struct idiom used throughout the
//! workspace: `Default` values, `with_*` builders, and a `validate()` step
//! run once when a session begins.

use crate::error::{SessionError, SessionResult};
use crate::loader::WaitPolicy;
use cubeseg_core::{Coord3, Shape3};
use cubeseg_region::ConnectivityType;

/// Block of the dataset a session works on
///
/// `begin` and `size` describe the core block that is read at begin and
/// written back at finish. The `margin` widens the block on every side for
/// flooding only; margin voxels are never written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkArea {
    pub begin: Coord3,
    pub size: Shape3,
    pub margin: usize,
}

impl WorkArea {
    /// Work area without margin
    pub fn new(begin: Coord3, size: Shape3) -> Self {
        Self {
            begin,
            size,
            margin: 0,
        }
    }

    /// Set the flooding margin
    pub fn with_margin(mut self, margin: usize) -> Self {
        self.margin = margin;
        self
    }

    /// Build a work area from the text fields an operator fills in
    ///
    /// `begin` is the one-based coordinate shown in the viewer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Configuration` for malformed text.
    pub fn parse(begin: &str, size: &str, margin: &str) -> SessionResult<Self> {
        let display: Coord3 = begin
            .parse()
            .map_err(|e| SessionError::Configuration(format!("work area begin: {e}")))?;
        let size: Shape3 = size
            .parse()
            .map_err(|e| SessionError::Configuration(format!("work area size: {e}")))?;
        let margin: usize = margin
            .trim()
            .parse()
            .map_err(|_| SessionError::Configuration(format!("margin: cannot parse '{margin}'")))?;
        Ok(Self::new(Coord3::from_display(display), size).with_margin(margin))
    }

    /// Last voxel of the core block (inclusive)
    pub fn end(&self) -> Coord3 {
        self.begin.last_of(self.size)
    }

    /// Center of the core block
    pub fn middle(&self) -> Coord3 {
        self.begin.midpoint(self.end())
    }

    /// Shape of the grids the engine floods, margin included
    pub fn padded_shape(&self) -> Shape3 {
        self.size.padded(self.margin)
    }

    /// Absolute coordinate of the first padded voxel
    pub fn padded_origin(&self) -> Coord3 {
        self.begin - Coord3::splat(self.margin as i64)
    }

    /// Position of the core block inside the padded grids
    pub fn core_offset(&self) -> Coord3 {
        Coord3::splat(self.margin as i64)
    }

    /// Padded-grid coordinate of an absolute coordinate
    pub fn to_local(&self, abs: Coord3) -> Option<Coord3> {
        let local = abs - self.padded_origin();
        self.padded_shape().contains(local).then_some(local)
    }

    /// Absolute coordinate of a padded-grid coordinate
    pub fn to_absolute(&self, local: Coord3) -> Coord3 {
        local + self.padded_origin()
    }
}

/// How `finish` writes the result back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinishMode {
    /// Write the session labels verbatim
    #[default]
    Replace,
    /// Keep the original label wherever the session left a voxel unassigned
    MergeOriginal,
}

/// Parameters of a basin session
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub work_area: WorkArea,
    /// First id handed to a new basin
    pub base_id: u64,
    /// Radius of seed marker nodes
    pub marker_radius: f64,
    /// Prediction values above this are membrane
    pub membrane_threshold: u8,
    /// Smallest basin a split may leave behind
    pub min_object_size: usize,
    /// Seed the slack basin from the eroded membrane at begin
    pub auto_slack: bool,
    /// Erosion iterations for automatic slack seeds
    pub slack_erosion_iters: u32,
    /// Neighbourhood of the watershed flood
    pub connectivity: ConnectivityType,
    pub wait: WaitPolicy,
    pub finish_mode: FinishMode,
    /// Prefix of the Done/Todo comments written at finish
    pub tag_prefix: String,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            work_area: WorkArea::default(),
            base_id: 10_000_000,
            marker_radius: 3.0,
            membrane_threshold: 150,
            min_object_size: 500,
            auto_slack: true,
            slack_erosion_iters: 1,
            connectivity: ConnectivityType::Six,
            wait: WaitPolicy::default(),
            finish_mode: FinishMode::Replace,
            tag_prefix: "BasinSession".to_string(),
        }
    }
}

impl SessionParams {
    /// Default parameters for the given work area
    pub fn new(work_area: WorkArea) -> Self {
        Self {
            work_area,
            ..Self::default()
        }
    }

    pub fn with_base_id(mut self, base_id: u64) -> Self {
        self.base_id = base_id;
        self
    }

    pub fn with_marker_radius(mut self, radius: f64) -> Self {
        self.marker_radius = radius;
        self
    }

    pub fn with_membrane_threshold(mut self, threshold: u8) -> Self {
        self.membrane_threshold = threshold;
        self
    }

    pub fn with_min_object_size(mut self, size: usize) -> Self {
        self.min_object_size = size;
        self
    }

    pub fn with_auto_slack(mut self, enabled: bool) -> Self {
        self.auto_slack = enabled;
        self
    }

    pub fn with_slack_erosion_iters(mut self, iters: u32) -> Self {
        self.slack_erosion_iters = iters;
        self
    }

    pub fn with_connectivity(mut self, connectivity: ConnectivityType) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_finish_mode(mut self, mode: FinishMode) -> Self {
        self.finish_mode = mode;
        self
    }

    pub fn with_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tag_prefix = prefix.into();
        self
    }

    /// Check the parameters before a session begins
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Configuration` describing the first problem.
    pub fn validate(&self) -> SessionResult<()> {
        let fail = |msg: String| -> SessionResult<()> { Err(SessionError::Configuration(msg)) };
        if self.work_area.size.is_empty() {
            return fail(format!("empty work area {}", self.work_area.size));
        }
        if self.base_id < 2 {
            return fail(format!(
                "base id {} collides with the reserved ids 0 and 1",
                self.base_id
            ));
        }
        if self.min_object_size == 0 {
            return fail("minimum object size must be positive".to_string());
        }
        if !(self.marker_radius.is_finite() && self.marker_radius > 0.0) {
            return fail(format!("invalid marker radius {}", self.marker_radius));
        }
        if self.tag_prefix.trim().is_empty() {
            return fail("empty tag prefix".to_string());
        }
        Ok(())
    }
}
