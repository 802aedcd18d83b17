use std::collections::HashMap;

use crate::domain::graph::graph::{Dag, Traversal};
use crate::domain::system::system::System;
use crate::domain::utils::id::NodeId;

/// Derives, tick by tick, which tasks may be placed next.
#[derive(Debug, Clone)]
pub struct ReadyTracker {
    queue: Vec<NodeId>,
    predecessors: HashMap<NodeId, Vec<NodeId>>,
}

impl ReadyTracker {
    /// `queue` holds every task of `dag` exactly once, highest priority first.
    pub fn new(dag: &Dag, queue: Vec<NodeId>) -> Self {
        let predecessors = queue.iter().map(|task| (task.clone(), dag.neighbours(task, Traversal::Backward))).collect();
        Self { queue, predecessors }
    }

    pub fn queue(&self) -> &[NodeId] {
        &self.queue
    }

    /// Unplaced tasks whose predecessors have all finished by `time`, in queue order.
    pub fn ready(&self, system: &System, time: i64) -> Vec<NodeId> {
        let finished = system.finished(time);
        let scheduled = system.scheduled();

        self.queue
            .iter()
            .filter(|task| !scheduled.contains(*task))
            .filter(|task| self.predecessors.get(*task).is_none_or(|parents| parents.iter().all(|parent| finished.contains(parent))))
            .cloned()
            .collect()
    }

    /// True once every queued task has finished by `time`.
    pub fn done(&self, system: &System, time: i64) -> bool {
        let finished = system.finished(time);
        self.queue.iter().all(|task| finished.contains(task))
    }
}
