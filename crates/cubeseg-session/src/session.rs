//! Basin session lifecycle
//!
//! A [`Session`] ties the registry, the engine and the workflow together and
//! talks to the host. It is created by [`Session::begin`], driven with
//! [`Session::execute`], and consumed by [`Session::finish`] or
//! [`Session::reset`].
//!
//! # Examples
//!
//! ```ignore
//! let mut session = Session::begin(&mut host, &prediction, params)?;
//! session.execute(Command::AddSeed { coord, slack: false })?;
//! let report = session.finish()?;
//! ```

use crate::command::{Command, Outcome};
use crate::engine::{SegmentationEngine, prepare_fields};
use crate::error::{ConflictKind, SessionError, SessionResult};
use crate::host::{Host, HostError, NodeId, TreeId};
use crate::loader::{CancelToken, wait_for_loader};
use crate::params::{FinishMode, SessionParams};
use crate::registry::{
    Basin, BasinId, BasinRegistry, Classification, INVALID_ID, SLACK_ID, is_invalid, is_ordinary,
    is_slack,
};
use crate::seeds::SeedVolume;
use crate::workflow::{PartitionState, Workflow, WorkflowPartition};
use cubeseg_core::{Coord3, Volume};
use cubeseg_region::{
    PriorityFloodWatershed, Watershed, WatershedOptions, count_label, label_mask, label_sizes,
};
use tracing::{debug, error, info, warn};

/// One row of the Pending or Done table
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub id: BasinId,
    /// One-based primary seed
    pub coord: Coord3,
    /// One-based subseeds
    pub subseeds: Vec<Coord3>,
    pub slack: bool,
    pub todo: bool,
    /// Top of the partition's focus stack
    pub focused: bool,
}

/// Summary of a finished session
#[derive(Debug, Clone, PartialEq)]
pub struct FinishReport {
    /// Slack-classified basins relabeled to the slack id
    pub merged_into_slack: Vec<BasinId>,
    /// Basins tagged in the annotation store
    pub tagged: Vec<BasinId>,
    /// Whether the session was ready to finish
    pub ready: bool,
}

/// Interactive decomposition of one work area
pub struct Session<'h, H: Host + ?Sized> {
    host: &'h mut H,
    params: SessionParams,
    registry: BasinRegistry,
    engine: SegmentationEngine,
    workflow: Workflow,
    active: BasinId,
    last: BasinId,
    staged: Vec<Coord3>,
    staged_tree: Option<TreeId>,
    original: Volume<u64>,
    warnings: Vec<SessionError>,
    cancel: CancelToken,
    aborted: bool,
}

impl<'h, H: Host + ?Sized> Session<'h, H> {
    /// Start a session with the reference watershed
    ///
    /// `prediction` is the membrane prediction over the padded work area.
    ///
    /// # Errors
    ///
    /// `SessionError::Configuration` for invalid parameters, a prediction of
    /// the wrong shape or a work area the host cannot serve;
    /// `SessionError::Stall` if the loader never settles.
    pub fn begin(
        host: &'h mut H,
        prediction: &Volume<u8>,
        params: SessionParams,
    ) -> SessionResult<Self> {
        let watershed = PriorityFloodWatershed::new(
            WatershedOptions::new().with_connectivity(params.connectivity),
        );
        Self::begin_with(host, prediction, params, Box::new(watershed), CancelToken::new())
    }

    /// Start a session with a caller-supplied watershed and cancel token
    pub fn begin_with(
        host: &'h mut H,
        prediction: &Volume<u8>,
        params: SessionParams,
        watershed: Box<dyn Watershed>,
        cancel: CancelToken,
    ) -> SessionResult<Self> {
        params.validate()?;
        let area = params.work_area;
        if prediction.shape() != area.padded_shape() {
            return Err(SessionError::Configuration(format!(
                "prediction is {}, work area with margin is {}",
                prediction.shape(),
                area.padded_shape()
            )));
        }

        host.set_position(area.middle());
        wait_for_loader(&*host, &params.wait, &cancel)?;
        let original = host.read(area.begin, area.size).map_err(|e| match e {
            HostError::Rejected(_) => SessionError::Host(e),
            other => SessionError::Configuration(format!("cannot read work area: {other}")),
        })?;

        let fields = prepare_fields(prediction, &params)?;
        let slack_seeds = fields.slack_seeds.filter(|mask| {
            let any = mask.count_true() > 0;
            if !any {
                warn!("membrane erodes to nothing, starting without a slack object");
            }
            any
        });
        let seeds = match &slack_seeds {
            Some(mask) => SeedVolume::from_mask(mask, SLACK_ID),
            None => SeedVolume::new(area.padded_shape())?,
        };
        let engine = SegmentationEngine::new(fields.cost, seeds, watershed)?;

        host.set_movement_area(area.begin, area.end());
        let mut session = Self {
            host,
            registry: BasinRegistry::new(params.base_id),
            engine,
            workflow: Workflow::new(),
            active: INVALID_ID,
            last: INVALID_ID,
            staged: Vec::new(),
            staged_tree: None,
            original,
            warnings: Vec::new(),
            cancel,
            aborted: false,
            params,
        };

        if let Err(e) = session.start(slack_seeds.is_some()) {
            session.host.reset_movement_area();
            return Err(e);
        }
        info!(
            begin = %area.begin,
            size = %area.size,
            margin = area.margin,
            auto_slack = session.registry.contains(SLACK_ID),
            "session started"
        );
        Ok(session)
    }

    fn start(&mut self, with_slack: bool) -> SessionResult<()> {
        if with_slack {
            self.engine.flood_full()?;
            let mut slack = Basin::new(SLACK_ID, Coord3::SENTINEL);
            slack.classification = Classification::Slack;
            self.registry.insert(slack);
            self.last = SLACK_ID;
            self.activate(SLACK_ID);
        } else {
            self.activate(INVALID_ID);
        }
        self.refresh_display()
    }

    /// Run one operator command
    ///
    /// # Errors
    ///
    /// Rejected commands leave the committed state unchanged. An
    /// `InvariantBroken` error aborts the session; afterwards every command
    /// fails with `SessionError::Aborted`.
    pub fn execute(&mut self, command: Command) -> SessionResult<Outcome> {
        if self.aborted {
            return Err(SessionError::Aborted);
        }
        debug!(?command, "executing");
        let structural = command.is_structural();
        let result = self.dispatch(command).and_then(|outcome| {
            if structural {
                self.check_invariants()?;
            }
            Ok(outcome)
        });
        if let Err(SessionError::InvariantBroken(reason)) = &result {
            error!(%reason, "aborting session");
            self.aborted = true;
        }
        result
    }

    fn dispatch(&mut self, command: Command) -> SessionResult<Outcome> {
        match command {
            Command::AddSeed { coord, slack } => self.add_seed(coord, slack),
            Command::StageSubseed { coord } => self.stage_subseed(coord),
            Command::ResetSubseeds => Ok(Outcome::StagingCleared {
                discarded: self.discard_staging()?,
            }),
            Command::Extend { coord } => self.extend(coord),
            Command::RemoveSeeds { ids } => self.remove_seeds(&ids),
            Command::UndoLast => self.undo_last(),
            Command::SelectBasin { id } => self.select_basin(id),
            Command::NavigateDone { id } => self.navigate_done(id),
            Command::ToggleDone { id } => self.toggle_done(id),
            Command::ToggleSlack { ids } => self.toggle_slack(&ids),
            Command::ToggleTodo { ids } => self.toggle_todo(&ids),
        }
    }

    fn add_seed(&mut self, coord: Coord3, slack: bool) -> SessionResult<Outcome> {
        self.require_active()?;
        let local = self.check_click(coord)?;

        let id = self.registry.allocate_id();
        let mut locals = vec![local];
        for &c in &self.staged {
            locals.push(self.local(c)?);
        }

        // Host calls that can fail come before the split commits
        let staged_tree = self.staged_tree;
        let (tree, node) = self.place_marker(coord, staged_tree)?;
        if let Err(e) = self
            .engine
            .try_split(id, &locals, self.params.min_object_size)
        {
            if matches!(e, SessionError::SizingViolation { .. }) {
                warn!(%e, %coord, "split rejected");
            }
            self.withdraw_marker(node, staged_tree.is_none().then_some(tree));
            return Err(e);
        }

        self.staged_tree = None;
        let mut basin = Basin::new(id, coord);
        basin.subseeds = std::mem::take(&mut self.staged);
        basin.tree = Some(tree);
        basin.node = Some(node);
        if slack {
            basin.classification = Classification::Slack;
        }
        self.registry.insert(basin);
        self.workflow
            .partition_state(WorkflowPartition::Pending)
            .push_bottom(id);

        let first = is_invalid(self.last);
        if first {
            let top = self.workflow.partition(WorkflowPartition::Pending).top();
            self.activate(top);
        }
        self.last = id;
        self.show();
        if first {
            self.jump_to(self.active);
        }

        let size = count_label(self.engine.labels(), id);
        info!(id, size, %coord, slack, "object created");
        Ok(Outcome::Created { id, size })
    }

    fn stage_subseed(&mut self, coord: Coord3) -> SessionResult<Outcome> {
        self.require_active()?;
        self.check_click(coord)?;
        if self.staged.contains(&coord) {
            return Err(SessionError::IllegalOperation(format!(
                "{coord} is already staged"
            )));
        }
        let staged_tree = self.staged_tree;
        let (tree, _) = self.place_marker(coord, staged_tree)?;
        self.staged_tree = Some(tree);
        self.staged.push(coord);
        debug!(%coord, staged = self.staged.len(), "subseed staged");
        Ok(Outcome::Staged {
            count: self.staged.len(),
        })
    }

    fn extend(&mut self, coord: Coord3) -> SessionResult<Outcome> {
        let local = self.local(coord)?;
        let seeded = self.engine.seed_at(local)?;
        if !is_invalid(seeded) {
            return Err(self.conflict(coord, seeded, ConflictKind::AlreadySeeded));
        }
        if self.engine.in_mask(local)? {
            return Err(SessionError::IllegalOperation(format!(
                "{coord} already belongs to the active object, add a seed instead"
            )));
        }
        let id = self.active;
        if !is_ordinary(id) {
            return Err(SessionError::IllegalOperation(
                "only an ordinary object can be extended".to_string(),
            ));
        }
        if !self.registry.contains(id) {
            return Err(SessionError::InvariantBroken(format!(
                "active object {id} has no record"
            )));
        }

        let known_tree = self.registry.get(id).and_then(|b| b.tree);
        let (tree, node) = self.place_marker(coord, known_tree)?;
        if let Err(e) = self.engine.extend(id, local) {
            self.withdraw_marker(node, known_tree.is_none().then_some(tree));
            return Err(e);
        }
        if let Some(basin) = self.registry.get_mut(id) {
            basin.tree = Some(tree);
            basin.subseeds.push(coord);
        }
        self.show();
        info!(id, %coord, "object extended");
        Ok(Outcome::Extended { id })
    }

    fn remove_seeds(&mut self, ids: &[BasinId]) -> SessionResult<Outcome> {
        let mut unique: Vec<BasinId> = Vec::with_capacity(ids.len());
        for &id in ids {
            if is_slack(id) {
                return Err(SessionError::IllegalOperation(
                    "the slack object cannot be removed".to_string(),
                ));
            }
            if !self.registry.contains(id) {
                return Err(SessionError::UnknownBasin(id));
            }
            if !unique.contains(&id) {
                unique.push(id);
            }
        }

        let mut plans = Vec::with_capacity(unique.len());
        for &id in &unique {
            let locals = match self.registry.get(id) {
                Some(basin) => basin
                    .seeds()
                    .map(|c| self.local(c))
                    .collect::<SessionResult<Vec<_>>>()?,
                None => return Err(SessionError::UnknownBasin(id)),
            };
            plans.push((id, locals));
        }

        let mut freed = None;
        let mut trees = Vec::new();
        for (id, locals) in plans {
            let (coord, tree) = self.remove_one(id, &locals)?;
            trees.extend(tree);
            freed = Some(coord);
        }
        for tree in trees {
            if let Err(e) = self.host.delete_tree(tree) {
                self.note(e.into());
            }
        }
        if let Some(coord) = freed {
            self.jump_to_coord(coord);
        }
        self.show();
        info!(?unique, active = self.active, "objects removed");
        Ok(Outcome::Removed {
            ids: unique,
            active: self.active,
        })
    }

    /// Remove one basin and hand its primary voxel to whoever floods it now
    ///
    /// `locals` are the basin's seeds in grid coordinates, primary first.
    /// Returns the freed primary seed and the marker tree left to delete.
    fn remove_one(
        &mut self,
        id: BasinId,
        locals: &[Coord3],
    ) -> SessionResult<(Coord3, Option<TreeId>)> {
        let basin = self
            .registry
            .remove(id)
            .ok_or(SessionError::UnknownBasin(id))?;
        self.workflow.forget(id);
        self.engine.remove(locals)?;

        let owner = self.engine.label_at(locals[0])?;
        if is_invalid(owner) {
            self.last = INVALID_ID;
            self.activate(INVALID_ID);
            return Ok((basin.primary_seed, basin.tree));
        }
        let state = self
            .registry
            .get(owner)
            .map(|b| b.state)
            .ok_or_else(|| {
                SessionError::InvariantBroken(format!(
                    "object {owner} floods {} but has no record",
                    basin.primary_seed
                ))
            })?;
        if state == WorkflowPartition::Done {
            if let Some(b) = self.registry.get_mut(owner) {
                b.state = WorkflowPartition::Pending;
            }
            self.workflow.transfer(owner, WorkflowPartition::Done);
            debug!(owner, "reopened object for the freed voxel");
        }
        self.activate(owner);
        Ok((basin.primary_seed, basin.tree))
    }

    fn undo_last(&mut self) -> SessionResult<Outcome> {
        let last = self.last;
        if !is_ordinary(last) || !self.registry.contains(last) {
            return Err(SessionError::IllegalOperation(
                "no split to undo".to_string(),
            ));
        }
        self.discard_staging()?;
        self.remove_seeds(&[last])
    }

    fn select_basin(&mut self, id: BasinId) -> SessionResult<Outcome> {
        let state = self.basin_state(id)?;
        if state == WorkflowPartition::Done {
            return Err(SessionError::IllegalOperation(format!(
                "object {id} is done, move it back to pending to edit it"
            )));
        }
        if id == self.active {
            self.workflow
                .partition_state(WorkflowPartition::Pending)
                .push_top(id);
            self.jump_to(id);
        } else {
            self.select(id);
        }
        Ok(Outcome::Selected { id })
    }

    fn navigate_done(&mut self, id: BasinId) -> SessionResult<Outcome> {
        if self.basin_state(id)? != WorkflowPartition::Done {
            return Err(SessionError::IllegalOperation(format!(
                "object {id} is not done"
            )));
        }
        self.jump_to(id);
        Ok(Outcome::Navigated { id })
    }

    fn toggle_done(&mut self, id: BasinId) -> SessionResult<Outcome> {
        let from = self.basin_state(id)?;
        let to = from.other();
        if let Some(basin) = self.registry.get_mut(id) {
            basin.state = to;
        }
        self.workflow.transfer(id, from);

        match from {
            WorkflowPartition::Pending => {
                let top = self.workflow.partition(WorkflowPartition::Pending).top();
                self.select(top);
            }
            WorkflowPartition::Done => self.select(id),
        }
        info!(id, ?to, active = self.active, "object moved");
        Ok(Outcome::Moved { id, to })
    }

    fn toggle_slack(&mut self, ids: &[BasinId]) -> SessionResult<Outcome> {
        let ids = self.known_unique(ids)?;
        if ids.iter().any(|&id| is_slack(id)) {
            return Err(SessionError::IllegalOperation(
                "the slack object cannot be reclassified".to_string(),
            ));
        }
        for &id in &ids {
            if let Some(basin) = self.registry.get_mut(id) {
                basin.classification = basin.classification.toggled();
            }
        }
        Ok(Outcome::Reclassified { ids })
    }

    fn toggle_todo(&mut self, ids: &[BasinId]) -> SessionResult<Outcome> {
        let ids = self.known_unique(ids)?;
        for &id in &ids {
            if let Some(basin) = self.registry.get_mut(id) {
                basin.todo = !basin.todo;
            }
        }
        Ok(Outcome::Reclassified { ids })
    }

    fn known_unique(&self, ids: &[BasinId]) -> SessionResult<Vec<BasinId>> {
        let mut unique = Vec::with_capacity(ids.len());
        for &id in ids {
            if !self.registry.contains(id) {
                return Err(SessionError::UnknownBasin(id));
            }
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Ok(unique)
    }

    fn basin_state(&self, id: BasinId) -> SessionResult<WorkflowPartition> {
        self.registry
            .get(id)
            .map(|b| b.state)
            .ok_or(SessionError::UnknownBasin(id))
    }

    /// Validate a clicked voxel as a new seed position
    fn check_click(&mut self, coord: Coord3) -> SessionResult<Coord3> {
        let local = self.local(coord)?;
        let seeded = self.engine.seed_at(local)?;
        if !is_invalid(seeded) {
            return Err(self.conflict(coord, seeded, ConflictKind::AlreadySeeded));
        }
        if !self.engine.in_mask(local)? {
            let owner = self.engine.label_at(local)?;
            self.jump_to(owner);
            return Err(self.conflict(coord, owner, ConflictKind::OutsideActiveBasin));
        }
        Ok(local)
    }

    fn conflict(&self, coord: Coord3, owner: BasinId, kind: ConflictKind) -> SessionError {
        warn!(%coord, owner, ?kind, "ownership conflict");
        SessionError::OwnershipConflict { coord, owner, kind }
    }

    fn require_active(&self) -> SessionResult<()> {
        if is_invalid(self.active) && !self.registry.is_empty() {
            return Err(SessionError::IllegalOperation(
                "no active object, select one first".to_string(),
            ));
        }
        Ok(())
    }

    fn local(&self, coord: Coord3) -> SessionResult<Coord3> {
        self.params
            .work_area
            .to_local(coord)
            .ok_or(SessionError::OutOfWorkArea(coord))
    }

    /// Add a seed marker to `tree`, or to a new tree when there is none
    fn place_marker(
        &mut self,
        coord: Coord3,
        tree: Option<TreeId>,
    ) -> SessionResult<(TreeId, NodeId)> {
        let (tree, fresh) = match tree {
            Some(tree) => (tree, false),
            None => (self.host.add_tree()?, true),
        };
        match self.host.add_node(coord, tree, self.params.marker_radius) {
            Ok(node) => Ok((tree, node)),
            Err(e) => {
                if fresh {
                    if let Err(cleanup) = self.host.delete_tree(tree) {
                        self.note(cleanup.into());
                    }
                }
                Err(e.into())
            }
        }
    }

    /// Take back a marker whose edit was rejected
    ///
    /// `fresh_tree` is the tree created for it, deleted along with the node.
    fn withdraw_marker(&mut self, node: NodeId, fresh_tree: Option<TreeId>) {
        let result = match fresh_tree {
            Some(tree) => self.host.delete_tree(tree),
            None => self.host.delete_node(node),
        };
        if let Err(e) = result.map_err(SessionError::from).and_then(|()| self.focus_node()) {
            self.note(e);
        }
    }

    /// Change the active basin without refreshing the display
    fn activate(&mut self, id: BasinId) {
        if id != self.active {
            if let Err(e) = self.discard_staging() {
                // Staging belongs to the previous basin, drop it regardless
                self.staged.clear();
                self.staged_tree = None;
                self.note(e);
            }
        }
        self.active = id;
        if !is_invalid(id) {
            self.workflow
                .partition_state(WorkflowPartition::Pending)
                .push_top(id);
        }
        self.engine.set_active(id);
    }

    /// Activate `id`, show it and move the viewport to it
    fn select(&mut self, id: BasinId) {
        self.activate(id);
        self.show();
        self.jump_to(id);
    }

    /// Drop staged subseeds and their marker tree
    ///
    /// Staging is kept when the host refuses to delete the tree.
    fn discard_staging(&mut self) -> SessionResult<usize> {
        if let Some(tree) = self.staged_tree {
            self.host.delete_tree(tree)?;
        }
        self.staged_tree = None;
        let discarded = self.staged.len();
        self.staged.clear();
        if discarded > 0 {
            debug!(discarded, "staging discarded");
        }
        Ok(discarded)
    }

    /// Recompute the mask and write the active basin to the host
    fn refresh_display(&mut self) -> SessionResult<()> {
        self.engine.set_active(self.active);
        let shown = self.engine.masked()?;
        let area = self.params.work_area;
        let core = shown.crop(area.core_offset(), area.size)?;
        self.settle();
        self.host.write(area.begin, &core)?;
        Ok(())
    }

    /// Show the committed state; host failures become warnings
    fn show(&mut self) {
        if let Err(e) = self.refresh_display().and_then(|()| self.focus_node()) {
            self.note(e);
        }
    }

    fn note(&mut self, e: SessionError) {
        warn!(%e, "host update failed");
        self.warnings.push(e);
    }

    fn focus_node(&mut self) -> SessionResult<()> {
        if let Some(node) = self.registry.get(self.active).and_then(|b| b.node) {
            self.host.set_active_node(node)?;
        }
        Ok(())
    }

    fn jump_to(&mut self, id: BasinId) {
        if !is_ordinary(id) {
            return;
        }
        if let Some(coord) = self.registry.get(id).map(|b| b.primary_seed) {
            self.jump_to_coord(coord);
        }
    }

    /// Move to the slice of `coord`, keeping the work area centered in x/y
    fn jump_to_coord(&mut self, coord: Coord3) {
        let middle = self.params.work_area.middle();
        self.host
            .set_position(Coord3::new(middle.x, middle.y, coord.z));
        self.settle();
    }

    /// Wait for the loader, recording a stall as a warning
    fn settle(&mut self) {
        if let Err(e) = wait_for_loader(&*self.host, &self.params.wait, &self.cancel) {
            warn!(%e, "loader did not settle");
            self.warnings.push(e);
        }
    }

    fn check_invariants(&self) -> SessionResult<()> {
        let broken = |msg: String| -> SessionResult<()> { Err(SessionError::InvariantBroken(msg)) };

        for &id in label_sizes(self.engine.seeds().as_volume()).keys() {
            if !is_invalid(id) && !self.registry.contains(id) {
                return broken(format!("seed volume carries unknown object {id}"));
            }
        }
        for &id in label_sizes(self.engine.labels()).keys() {
            if !is_invalid(id) && !self.registry.contains(id) {
                return broken(format!("label volume carries unknown object {id}"));
            }
        }
        if *self.engine.mask() != label_mask(self.engine.labels(), self.active) {
            return broken(format!("mask of active object {} is stale", self.active));
        }
        if !is_invalid(self.active) {
            match self.registry.get(self.active) {
                Some(b) if b.state == WorkflowPartition::Pending => {}
                Some(_) => return broken(format!("active object {} is done", self.active)),
                None => return broken(format!("active object {} has no record", self.active)),
            }
        }
        for partition in [WorkflowPartition::Pending, WorkflowPartition::Done] {
            for &id in self.workflow.partition(partition).ids() {
                if self.registry.get(id).map(|b| b.state) != Some(partition) {
                    return broken(format!("{partition:?} focus stack holds object {id}"));
                }
            }
        }
        for basin in self.registry.iter() {
            if self.registry.owner_of(basin.primary_seed) != Some(basin.id) {
                return broken(format!("object {} missing from coordinate index", basin.id));
            }
        }
        Ok(())
    }

    /// Check the session's bookkeeping, aborting the session on failure
    pub fn verify_invariants(&mut self) -> SessionResult<()> {
        let result = self.check_invariants();
        if let Err(SessionError::InvariantBroken(reason)) = &result {
            error!(%reason, "aborting session");
            self.aborted = true;
        }
        result
    }

    /// Every ordinary basin is done; only the slack basin may still be pending
    pub fn ready_to_finish(&self) -> bool {
        self.registry
            .iter()
            .filter(|b| b.state == WorkflowPartition::Pending)
            .all(|b| is_slack(b.id))
    }

    /// Rows of one table, ordered by primary seed
    pub fn table(&self, partition: WorkflowPartition) -> Vec<TableRow> {
        let focused = self.workflow.partition(partition).top();
        let mut rows: Vec<TableRow> = self
            .registry
            .iter()
            .filter(|b| b.state == partition)
            .map(|b| TableRow {
                id: b.id,
                coord: b.primary_seed.to_display(),
                subseeds: b.subseeds.iter().map(|c| c.to_display()).collect(),
                slack: b.is_slack_classified(),
                todo: b.todo,
                focused: b.id == focused,
            })
            .collect();
        rows.sort_by_key(|r| (r.coord, r.id));
        rows
    }

    /// Merge slack basins, write the result back and tag the objects
    ///
    /// # Errors
    ///
    /// `SessionError::Aborted` after an invariant break; host and loader
    /// failures while writing back.
    pub fn finish(mut self) -> SessionResult<FinishReport> {
        if self.aborted {
            return Err(SessionError::Aborted);
        }
        let ready = self.ready_to_finish();
        if !ready {
            warn!(
                pending = self.registry.ids_in(WorkflowPartition::Pending).len(),
                "finishing with pending objects"
            );
        }
        self.discard_staging()?;

        let merged: Vec<BasinId> = self
            .registry
            .iter()
            .filter(|b| b.is_slack_classified() && !is_slack(b.id))
            .map(|b| b.id)
            .collect();
        for &id in &merged {
            let voxels = self.engine.merge_into_slack(id);
            debug!(id, voxels, "merged into slack");
        }

        let area = self.params.work_area;
        let mut output = self
            .engine
            .labels()
            .crop(area.core_offset(), area.size)?;
        if self.params.finish_mode == FinishMode::MergeOriginal {
            output = output.zip_map(&self.original, |ws, orig| {
                if is_invalid(ws) { orig } else { ws }
            })?;
        }
        wait_for_loader(&*self.host, &self.params.wait, &self.cancel)?;
        self.host.write(area.begin, &output)?;

        let done = format!("{}_Done", self.params.tag_prefix);
        let todo = format!("{}_Todo", self.params.tag_prefix);
        let mut tagged = Vec::new();
        for basin in self.registry.iter().filter(|b| !b.is_slack_classified()) {
            let comment = if basin.todo { &todo } else { &done };
            self.host
                .tag_object(basin.id, basin.primary_seed, comment)?;
            tagged.push(basin.id);
        }
        if count_label(self.engine.labels(), SLACK_ID) > 0 {
            let slack_todo = self.registry.get(SLACK_ID).is_some_and(|b| b.todo);
            let comment = if slack_todo { &todo } else { &done };
            self.host.tag_object(SLACK_ID, Coord3::SENTINEL, comment)?;
            tagged.push(SLACK_ID);
        }

        self.release()?;
        info!(merged = merged.len(), tagged = tagged.len(), ready, "session finished");
        Ok(FinishReport {
            merged_into_slack: merged,
            tagged,
            ready,
        })
    }

    /// Restore the original labels and end the session
    ///
    /// Also accepted after the session was aborted.
    pub fn reset(mut self) -> SessionResult<()> {
        let area = self.params.work_area;
        wait_for_loader(&*self.host, &self.params.wait, &self.cancel)?;
        self.host.write(area.begin, &self.original)?;
        self.release()?;
        info!(aborted = self.aborted, "session reset");
        Ok(())
    }

    fn release(&mut self) -> SessionResult<()> {
        self.discard_staging()?;
        let trees: Vec<TreeId> = self.registry.iter().filter_map(|b| b.tree).collect();
        for tree in trees {
            self.host.delete_tree(tree)?;
        }
        self.host.reset_movement_area();
        Ok(())
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    /// Currently active basin, [`INVALID_ID`] if none
    pub fn active_id(&self) -> BasinId {
        self.active
    }

    /// Most recently created basin
    pub fn last_id(&self) -> BasinId {
        self.last
    }

    pub fn basin(&self, id: BasinId) -> Option<&Basin> {
        self.registry.get(id)
    }

    pub fn registry(&self) -> &BasinRegistry {
        &self.registry
    }

    /// Ids in one partition, ascending
    pub fn partition_ids(&self, partition: WorkflowPartition) -> Vec<BasinId> {
        self.registry.ids_in(partition)
    }

    pub fn focus(&self, partition: WorkflowPartition) -> &PartitionState {
        self.workflow.partition(partition)
    }

    /// Committed labels over the padded work area
    pub fn labels(&self) -> &Volume<u64> {
        self.engine.labels()
    }

    pub fn active_mask(&self) -> &Volume<bool> {
        self.engine.mask()
    }

    pub fn seeds(&self) -> &SeedVolume {
        self.engine.seeds()
    }

    pub fn cost(&self) -> &Volume<f64> {
        self.engine.cost()
    }

    /// Original labels of the core work area
    pub fn original(&self) -> &Volume<u64> {
        &self.original
    }

    /// Staged subseeds, absolute
    pub fn staged(&self) -> &[Coord3] {
        &self.staged
    }

    /// Recoverable problems met while navigating or refreshing
    pub fn warnings(&self) -> &[SessionError] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<SessionError> {
        std::mem::take(&mut self.warnings)
    }

    /// Token that cancels this session's loader waits
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn host(&self) -> &H {
        &*self.host
    }
}
