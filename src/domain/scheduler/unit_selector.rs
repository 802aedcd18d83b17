use std::collections::BTreeMap;
use std::fmt::Debug;
use std::str::FromStr;

use crate::domain::scheduler::context::SchedulingContext;
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// Chooses the unit a ready task runs on.
pub trait UnitSelector: Debug {
    /// # Returns
    /// The chosen unit, or `None` if no unit can take `task` at `time` (the task is retried on
    /// a later tick).
    fn choose_unit(&self, ctx: &mut SchedulingContext<'_>, time: i64, task: &NodeId) -> Result<Option<NodeId>>;
}

/// The free unit ranked highest by the unit priority policy. Units without links are passed
/// over when the task's inputs live elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrioritySelector;

impl UnitSelector for PrioritySelector {
    fn choose_unit(&self, ctx: &mut SchedulingContext<'_>, time: i64, task: &NodeId) -> Result<Option<NodeId>> {
        let candidates = ctx.candidates(time, task)?;
        Ok(ctx.ranking.pick(&candidates))
    }
}

/// How the per-source-unit transfer costs of one candidate are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostAggregation {
    /// Total traffic towards the candidate.
    #[default]
    Sum,
    /// Traffic from the most expensive source unit only.
    Max,
}

impl CostAggregation {
    pub fn apply(self, costs: impl IntoIterator<Item = i64>) -> i64 {
        match self {
            CostAggregation::Sum => costs.into_iter().sum(),
            CostAggregation::Max => costs.into_iter().max().unwrap_or(0),
        }
    }
}

impl FromStr for CostAggregation {
    type Err = Error;

    fn from_str(name: &str) -> Result<CostAggregation> {
        match name.to_ascii_lowercase().as_str() {
            "sum" => Ok(CostAggregation::Sum),
            "max" => Ok(CostAggregation::Max),
            _ => Err(Error::UnknownPolicy(format!("cost aggregation '{}'", name))),
        }
    }
}

/// The free unit with the cheapest estimated inbound traffic, ties by unit priority. Units that
/// can not receive the inputs at all are skipped.
///
/// The cost of one inbound edge is `hops * edge weight`. Costs are summed per source unit and
/// the per-source totals are combined with the configured [`CostAggregation`]. Nothing is
/// placed on the timelines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestTransferSelector {
    pub aggregation: CostAggregation,
}

impl NearestTransferSelector {
    pub fn new(aggregation: CostAggregation) -> Self {
        Self { aggregation }
    }

    fn transfer_cost(&self, ctx: &SchedulingContext<'_>, time: i64, task: &NodeId, unit: &NodeId) -> Result<i64> {
        let mut per_source: BTreeMap<NodeId, i64> = BTreeMap::new();

        for edge in ctx.dag.edges_to(task) {
            let source_unit = ctx.system.unit_running(&edge.source)?;
            let route = ctx.route(time, &source_unit, unit)?;
            *per_source.entry(source_unit).or_insert(0) += route.len() as i64 * edge.weight;
        }

        Ok(self.aggregation.apply(per_source.into_values()))
    }
}

impl UnitSelector for NearestTransferSelector {
    fn choose_unit(&self, ctx: &mut SchedulingContext<'_>, time: i64, task: &NodeId) -> Result<Option<NodeId>> {
        let free = ctx.candidates(time, task)?;
        if free.is_empty() {
            return Ok(None);
        }

        let mut costs: Vec<(NodeId, i64)> = Vec::with_capacity(free.len());
        for unit in free {
            let cost = self.transfer_cost(ctx, time, task, &unit)?;
            costs.push((unit, cost));
        }

        let Some(cheapest) = costs.iter().map(|(_, cost)| *cost).min() else {
            return Ok(None);
        };
        let best = costs.iter().filter(|(_, cost)| *cost == cheapest).map(|(unit, _)| unit);
        Ok(ctx.ranking.pick(best))
    }
}

/// Tries the task on every unit and keeps the one with the earliest start.
///
/// Each trial places the inbound transfers and the calculation inside the open session and
/// cancels it afterwards, so the timelines are left exactly as they were. Units that cannot
/// take the task at all (`Error::NoFeasibleTime`) are skipped. Ties go to unit priority.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModellingSelector;

impl ModellingSelector {
    fn trial(ctx: &mut SchedulingContext<'_>, time: i64, task: &NodeId, unit: &NodeId) -> Result<i64> {
        let transfer_scheduler = ctx.transfer_scheduler;
        let weight = ctx.weight(task)?;

        let ready = transfer_scheduler.schedule_transfers(ctx, time, task, unit)?;
        let calc = ctx.system.schedule_calculation(task, ready, weight, unit)?;
        Ok(calc.start)
    }
}

impl UnitSelector for ModellingSelector {
    fn choose_unit(&self, ctx: &mut SchedulingContext<'_>, time: i64, task: &NodeId) -> Result<Option<NodeId>> {
        let units: Vec<NodeId> = ctx.system.unit_ids().cloned().collect();
        let mut starts: Vec<(NodeId, i64)> = Vec::with_capacity(units.len());

        for unit in units {
            let outcome = Self::trial(ctx, time, task, &unit);
            ctx.system.cancel_session();

            match outcome {
                Ok(start) => starts.push((unit, start)),
                Err(Error::NoFeasibleTime { .. }) => log::trace!("Unit {} cannot take task {}", unit, task),
                Err(err) => return Err(err),
            }
        }

        let Some(earliest) = starts.iter().map(|(_, start)| *start).min() else {
            return Ok(None);
        };
        let best = starts.iter().filter(|(_, start)| *start == earliest).map(|(unit, _)| unit);
        Ok(ctx.ranking.pick(best))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSelectorType {
    Priority,
    NearestTransfer,
    Modelling,
}

impl UnitSelectorType {
    /// `aggregation` only matters for [`UnitSelectorType::NearestTransfer`].
    pub fn get_instance(self, aggregation: CostAggregation) -> Box<dyn UnitSelector> {
        match self {
            UnitSelectorType::Priority => Box::new(PrioritySelector),
            UnitSelectorType::NearestTransfer => Box::new(NearestTransferSelector::new(aggregation)),
            UnitSelectorType::Modelling => Box::new(ModellingSelector),
        }
    }
}

impl FromStr for UnitSelectorType {
    type Err = Error;

    fn from_str(name: &str) -> Result<UnitSelectorType> {
        match name.to_ascii_lowercase().as_str() {
            "priority" => Ok(UnitSelectorType::Priority),
            "nearest-transfer" => Ok(UnitSelectorType::NearestTransfer),
            "modelling" | "modeling" => Ok(UnitSelectorType::Modelling),
            _ => Err(Error::UnknownPolicy(format!("unit selector '{}'", name))),
        }
    }
}
