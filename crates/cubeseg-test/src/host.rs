//! In-memory host for driving sessions in tests
//!
//! [`MemoryHost`] keeps the labeled dataset, the annotation skeleton and the
//! viewport in plain collections and records every call a session makes, so
//! tests can assert on what was written, tagged and focused.

use crate::error::TestResult;
use cubeseg_core::{Coord3, Shape3, Volume};
use cubeseg_session::{
    Annotations, HostError, HostResult, Navigator, NodeId, TreeId, VoxelRegion,
};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Node of the in-memory skeleton
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryNode {
    pub coord: Coord3,
    pub tree: TreeId,
    pub radius: f64,
}

/// Object tag written at finish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub basin: u64,
    pub coord: Coord3,
    pub comment: String,
}

/// Handle that keeps the loader of a [`MemoryHost`] from ever finishing
///
/// The session borrows its host mutably for its whole life, so tests flip
/// the loader through this shared handle instead.
#[derive(Debug, Clone, Default)]
pub struct LoaderSwitch(Rc<Cell<bool>>);

impl LoaderSwitch {
    /// Make every loader poll report "still loading"
    pub fn stall(&self) {
        self.0.set(true);
    }

    pub fn resume(&self) {
        self.0.set(false);
    }

    pub fn is_stalled(&self) -> bool {
        self.0.get()
    }
}

/// Handle that makes the annotation store of a [`MemoryHost`] refuse edits
///
/// While locked, adding or deleting trees and nodes fails with
/// `HostError::Rejected`.
#[derive(Debug, Clone, Default)]
pub struct AnnotationLock(Rc<Cell<bool>>);

impl AnnotationLock {
    pub fn lock(&self) {
        self.0.set(true);
    }

    pub fn unlock(&self) {
        self.0.set(false);
    }

    pub fn is_locked(&self) -> bool {
        self.0.get()
    }

    fn check(&self) -> HostResult<()> {
        if self.is_locked() {
            return Err(HostError::Rejected("annotations locked".to_string()));
        }
        Ok(())
    }
}

/// Host backed by an in-memory label volume
#[derive(Debug)]
pub struct MemoryHost {
    dataset: Volume<u64>,
    origin: Coord3,
    max_region: Option<usize>,
    rejected: bool,
    loader_latency: u32,
    pending_polls: Cell<u32>,
    polls: Cell<u64>,
    switch: LoaderSwitch,
    lock: AnnotationLock,
    node_limit: Option<usize>,
    position: Coord3,
    positions: Vec<Coord3>,
    movement_area: Option<(Coord3, Coord3)>,
    trees: BTreeMap<TreeId, Vec<NodeId>>,
    nodes: BTreeMap<NodeId, MemoryNode>,
    next_handle: u64,
    active_node: Option<NodeId>,
    tags: Vec<Tag>,
    reads: usize,
    writes: usize,
}

impl MemoryHost {
    /// Host whose dataset starts at the absolute origin
    pub fn new(labels: Volume<u64>) -> Self {
        Self {
            dataset: labels,
            origin: Coord3::splat(0),
            max_region: None,
            rejected: false,
            loader_latency: 0,
            pending_polls: Cell::new(0),
            polls: Cell::new(0),
            switch: LoaderSwitch::default(),
            lock: AnnotationLock::default(),
            node_limit: None,
            position: Coord3::splat(0),
            positions: Vec::new(),
            movement_area: None,
            trees: BTreeMap::new(),
            nodes: BTreeMap::new(),
            next_handle: 1,
            active_node: None,
            tags: Vec::new(),
            reads: 0,
            writes: 0,
        }
    }

    /// Host holding a constant-label dataset
    pub fn filled(shape: Shape3, label: u64) -> TestResult<Self> {
        Ok(Self::new(Volume::new(shape, label)?))
    }

    /// Place the dataset's first voxel at `origin`
    pub fn with_origin(mut self, origin: Coord3) -> Self {
        self.origin = origin;
        self
    }

    /// Refuse reads and writes of more than `voxels` voxels
    pub fn with_max_region(mut self, voxels: usize) -> Self {
        self.max_region = Some(voxels);
        self
    }

    /// Refuse every read and write outright
    pub fn with_rejection(mut self) -> Self {
        self.rejected = true;
        self
    }

    /// Report "still loading" for `polls` polls after every move
    pub fn with_loader_latency(mut self, polls: u32) -> Self {
        self.loader_latency = polls;
        self
    }

    /// Refuse new nodes once the store holds `nodes` of them
    pub fn with_node_limit(mut self, nodes: usize) -> Self {
        self.node_limit = Some(nodes);
        self
    }

    /// Shared handle that locks the annotation store
    pub fn annotation_lock(&self) -> AnnotationLock {
        self.lock.clone()
    }

    /// Shared handle that stalls the loader
    pub fn loader_switch(&self) -> LoaderSwitch {
        self.switch.clone()
    }

    pub fn dataset(&self) -> &Volume<u64> {
        &self.dataset
    }

    /// Label at an absolute coordinate
    pub fn label_at(&self, coord: Coord3) -> Option<u64> {
        self.dataset.get(coord - self.origin).ok()
    }

    /// Every position the viewport was moved to, in order
    pub fn positions(&self) -> &[Coord3] {
        &self.positions
    }

    pub fn movement_area(&self) -> Option<(Coord3, Coord3)> {
        self.movement_area
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, node: NodeId) -> Option<&MemoryNode> {
        self.nodes.get(&node)
    }

    /// Nodes of one tree, in insertion order
    pub fn tree_nodes(&self, tree: TreeId) -> Vec<MemoryNode> {
        self.trees
            .get(&tree)
            .map(|ids| ids.iter().filter_map(|n| self.nodes.get(n)).copied().collect())
            .unwrap_or_default()
    }

    pub fn active_node(&self) -> Option<NodeId> {
        self.active_node
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Number of loader polls answered so far
    pub fn polls(&self) -> u64 {
        self.polls.get()
    }

    fn check_region(&self, origin: Coord3, shape: Shape3) -> HostResult<Coord3> {
        if self.rejected {
            return Err(HostError::Rejected("dataset is read-only".to_string()));
        }
        if let Some(limit) = self.max_region {
            if shape.len() > limit {
                return Err(HostError::RegionTooLarge {
                    requested: shape.len(),
                    limit,
                });
            }
        }
        let local = origin - self.origin;
        let fits = self.dataset.contains(local) && self.dataset.contains(local.last_of(shape));
        if !fits {
            return Err(HostError::OutOfBounds { origin, shape });
        }
        Ok(local)
    }

    fn next_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl VoxelRegion for MemoryHost {
    fn read(&mut self, origin: Coord3, shape: Shape3) -> HostResult<Volume<u64>> {
        let local = self.check_region(origin, shape)?;
        self.reads += 1;
        self.dataset
            .crop(local, shape)
            .map_err(|_| HostError::OutOfBounds { origin, shape })
    }

    fn write(&mut self, origin: Coord3, labels: &Volume<u64>) -> HostResult<()> {
        let shape = labels.shape();
        let local = self.check_region(origin, shape)?;
        self.writes += 1;
        self.dataset
            .paste(local, labels)
            .map_err(|_| HostError::OutOfBounds { origin, shape })
    }

    fn set_movement_area(&mut self, begin: Coord3, end: Coord3) {
        self.movement_area = Some((begin, end));
    }

    fn reset_movement_area(&mut self) {
        self.movement_area = None;
    }
}

impl Annotations for MemoryHost {
    fn add_tree(&mut self) -> HostResult<TreeId> {
        self.lock.check()?;
        let tree = TreeId(self.next_handle());
        self.trees.insert(tree, Vec::new());
        Ok(tree)
    }

    fn delete_tree(&mut self, tree: TreeId) -> HostResult<()> {
        self.lock.check()?;
        let nodes = self
            .trees
            .remove(&tree)
            .ok_or_else(|| HostError::Rejected(format!("no tree {}", tree.0)))?;
        for node in nodes {
            self.nodes.remove(&node);
            if self.active_node == Some(node) {
                self.active_node = None;
            }
        }
        Ok(())
    }

    fn add_node(&mut self, coord: Coord3, tree: TreeId, radius: f64) -> HostResult<NodeId> {
        self.lock.check()?;
        if !self.trees.contains_key(&tree) {
            return Err(HostError::Rejected(format!("no tree {}", tree.0)));
        }
        if self.node_limit.is_some_and(|limit| self.nodes.len() >= limit) {
            return Err(HostError::Rejected("node store full".to_string()));
        }
        let node = NodeId(self.next_handle());
        self.nodes.insert(node, MemoryNode { coord, tree, radius });
        if let Some(nodes) = self.trees.get_mut(&tree) {
            nodes.push(node);
        }
        self.active_node = Some(node);
        Ok(node)
    }

    fn delete_node(&mut self, node: NodeId) -> HostResult<()> {
        self.lock.check()?;
        let removed = self
            .nodes
            .remove(&node)
            .ok_or_else(|| HostError::Rejected(format!("no node {}", node.0)))?;
        if let Some(nodes) = self.trees.get_mut(&removed.tree) {
            nodes.retain(|&n| n != node);
        }
        if self.active_node == Some(node) {
            self.active_node = None;
        }
        Ok(())
    }

    fn set_active_node(&mut self, node: NodeId) -> HostResult<()> {
        if !self.nodes.contains_key(&node) {
            return Err(HostError::Rejected(format!("no node {}", node.0)));
        }
        self.active_node = Some(node);
        Ok(())
    }

    fn tag_object(&mut self, basin: u64, coord: Coord3, comment: &str) -> HostResult<()> {
        self.tags.push(Tag {
            basin,
            coord,
            comment: comment.to_string(),
        });
        Ok(())
    }
}

impl Navigator for MemoryHost {
    fn position(&self) -> Coord3 {
        self.position
    }

    fn set_position(&mut self, coord: Coord3) {
        self.position = coord;
        self.positions.push(coord);
        self.pending_polls.set(self.loader_latency);
    }

    fn is_loader_finished(&self) -> bool {
        self.polls.set(self.polls.get() + 1);
        if self.switch.is_stalled() {
            return false;
        }
        let pending = self.pending_polls.get();
        if pending > 0 {
            self.pending_polls.set(pending - 1);
            return false;
        }
        true
    }
}
