use crate::domain::graph::graph::Dag;
use crate::domain::routing::router::{Route, Router};
use crate::domain::scheduler::transfer_scheduler::TransferScheduler;
use crate::domain::scheduler::unit_priority::UnitRanking;
use crate::domain::system::system::System;
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// Everything a policy needs while placing one task.
pub struct SchedulingContext<'a> {
    pub dag: &'a Dag,
    pub system: &'a mut System,
    pub router: &'a dyn Router,
    pub ranking: &'a UnitRanking,
    pub transfer_scheduler: &'a dyn TransferScheduler,
}

impl<'a> SchedulingContext<'a> {
    pub fn route(&self, time: i64, source: &NodeId, target: &NodeId) -> Result<Route> {
        self.router.route(time, source, target)
    }

    /// True iff every input of `task` can reach `unit`: its producer runs there, or both
    /// ends have at least one link.
    pub fn can_receive(&self, task: &NodeId, unit: &NodeId) -> Result<bool> {
        if self.link_count(unit) > 0 {
            for edge in self.dag.edges_to(task) {
                let source_unit = self.system.unit_running(&edge.source)?;
                if &source_unit != unit && self.link_count(&source_unit) == 0 {
                    return Ok(false);
                }
            }
            return Ok(true);
        }

        for edge in self.dag.edges_to(task) {
            if &self.system.unit_running(&edge.source)? != unit {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn link_count(&self, unit: &NodeId) -> usize {
        self.system.unit(unit).map_or(0, |unit| unit.links().len())
    }

    /// Free units at `time` that can receive the inputs of `task`, in id order.
    pub fn candidates(&self, time: i64, task: &NodeId) -> Result<Vec<NodeId>> {
        let mut candidates = Vec::new();
        for unit in self.system.free_units(time) {
            if self.can_receive(task, &unit)? {
                candidates.push(unit);
            } else {
                log::trace!("Unit {} can not receive the inputs of task {}", unit, task);
            }
        }
        Ok(candidates)
    }

    /// Execution cost of `task`.
    pub fn weight(&self, task: &NodeId) -> Result<i64> {
        self.dag.node(task).map(|node| node.weight).ok_or_else(|| Error::UnknownNode(task.clone()))
    }
}
