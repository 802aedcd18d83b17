use std::fmt::Debug;
use std::str::FromStr;

use crate::domain::scheduler::context::SchedulingContext;
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// Places the inbound data transfers of a task before it runs.
pub trait TransferScheduler: Debug {
    /// Schedules a transmission for every inbound edge of `task` towards `unit`.
    ///
    /// # Returns
    /// The time at which all inputs are available on `unit`, never earlier than `time`.
    fn schedule_transfers(&self, ctx: &mut SchedulingContext<'_>, time: i64, task: &NodeId, unit: &NodeId) -> Result<i64>;
}

/// Starts every transfer no earlier than the consumer's candidate time.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdvanceTransfers;

impl TransferScheduler for NoAdvanceTransfers {
    fn schedule_transfers(&self, ctx: &mut SchedulingContext<'_>, time: i64, task: &NodeId, unit: &NodeId) -> Result<i64> {
        let dag = ctx.dag;
        let mut ready = time;

        for edge in dag.edges_to(task) {
            let source_unit = ctx.system.unit_running(&edge.source)?;
            let route = ctx.route(time, &source_unit, unit)?;
            let transmission = ctx.system.schedule_transmission(&route, unit, time, &edge.source, &edge.target, edge.weight)?;
            ready = ready.max(transmission.end_time());
        }

        Ok(ready)
    }
}

/// Starts every transfer as soon as its producer has finished, possibly before the consumer's
/// candidate time.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvanceTransfers;

impl TransferScheduler for AdvanceTransfers {
    fn schedule_transfers(&self, ctx: &mut SchedulingContext<'_>, time: i64, task: &NodeId, unit: &NodeId) -> Result<i64> {
        let dag = ctx.dag;
        let mut ready = time;

        for edge in dag.edges_to(task) {
            let source_unit = ctx.system.unit_running(&edge.source)?;
            let produced = ctx.system.calc_of(&edge.source).map_or(time, |calc| calc.end);

            let route = ctx.route(produced, &source_unit, unit)?;
            let transmission = ctx.system.schedule_transmission(&route, unit, produced, &edge.source, &edge.target, edge.weight)?;
            ready = ready.max(transmission.end_time());
        }

        Ok(ready)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSchedulerType {
    NoAdvance,
    Advance,
}

impl TransferSchedulerType {
    pub fn get_instance(self) -> Box<dyn TransferScheduler> {
        match self {
            TransferSchedulerType::NoAdvance => Box::new(NoAdvanceTransfers),
            TransferSchedulerType::Advance => Box::new(AdvanceTransfers),
        }
    }
}

impl FromStr for TransferSchedulerType {
    type Err = Error;

    fn from_str(name: &str) -> Result<TransferSchedulerType> {
        match name.to_ascii_lowercase().as_str() {
            "no-advance" => Ok(TransferSchedulerType::NoAdvance),
            "advance" => Ok(TransferSchedulerType::Advance),
            _ => Err(Error::UnknownPolicy(format!("transfer scheduler '{}'", name))),
        }
    }
}
