//! Pending/Done partitions and their focus stacks

use crate::registry::{BasinId, INVALID_ID};

/// The two workflow partitions a basin can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowPartition {
    /// Still being refined
    Pending,
    /// Considered final
    Done,
}

impl WorkflowPartition {
    /// The opposite partition
    pub fn other(self) -> Self {
        match self {
            WorkflowPartition::Pending => WorkflowPartition::Done,
            WorkflowPartition::Done => WorkflowPartition::Pending,
        }
    }
}

/// Focus stack of one partition
///
/// The top is the most recently focused basin. Each id appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionState {
    stack: Vec<BasinId>,
}

impl PartitionState {
    /// Move `id` to the top, returning the previous top
    pub fn push_top(&mut self, id: BasinId) -> BasinId {
        let prev = self.top();
        if prev != id {
            self.stack.retain(|&x| x != id);
            self.stack.push(id);
        }
        prev
    }

    /// Move `id` to the bottom, keeping the current top unless the stack was empty
    pub fn push_bottom(&mut self, id: BasinId) {
        self.stack.retain(|&x| x != id);
        self.stack.insert(0, id);
    }

    /// Drop `id`, returning the new top
    pub fn pop(&mut self, id: BasinId) -> BasinId {
        self.stack.retain(|&x| x != id);
        self.top()
    }

    /// Most recently focused id, or [`INVALID_ID`]
    pub fn top(&self) -> BasinId {
        self.stack.last().copied().unwrap_or(INVALID_ID)
    }

    pub fn contains(&self, id: BasinId) -> bool {
        self.stack.contains(&id)
    }

    /// Ids from bottom to top
    pub fn ids(&self) -> &[BasinId] {
        &self.stack
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

/// Focus state of both partitions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workflow {
    pending: PartitionState,
    done: PartitionState,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition(&self, partition: WorkflowPartition) -> &PartitionState {
        match partition {
            WorkflowPartition::Pending => &self.pending,
            WorkflowPartition::Done => &self.done,
        }
    }

    pub fn partition_state(&mut self, partition: WorkflowPartition) -> &mut PartitionState {
        match partition {
            WorkflowPartition::Pending => &mut self.pending,
            WorkflowPartition::Done => &mut self.done,
        }
    }

    /// Move `id` from the focus stack of `from` to the top of the other one
    pub fn transfer(&mut self, id: BasinId, from: WorkflowPartition) {
        self.partition_state(from).pop(id);
        self.partition_state(from.other()).push_top(id);
    }

    /// Forget `id` in both partitions
    pub fn forget(&mut self, id: BasinId) {
        self.pending.pop(id);
        self.done.pop(id);
    }
}
