use slotmap::new_key_type;

use crate::domain::utils::id::NodeId;

new_key_type! {
    /// Key of a calculation inside its unit's timeline.
    pub struct CalcTaskId;
}

/// A task placed on a unit's compute timeline over `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalcTask {
    pub task: NodeId,
    pub unit: NodeId,
    pub start: i64,
    pub end: i64,
}

impl CalcTask {
    pub fn new(task: NodeId, unit: NodeId, start: i64, duration: i64) -> Self {
        Self { task, unit, start, end: start + duration }
    }

    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// True iff the interval shares at least one tick with `[start, end)`. Empty intervals share none.
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        self.start < self.end && start < end && self.start < end && start < self.end
    }

    pub fn is_finished(&self, time: i64) -> bool {
        self.end <= time
    }
}
