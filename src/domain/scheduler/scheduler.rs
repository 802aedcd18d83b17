use crate::domain::graph::graph::{Dag, Topology};
use crate::domain::routing::router::Router;
use crate::domain::scheduler::context::SchedulingContext;
use crate::domain::scheduler::queue_policy::QueuePolicy;
use crate::domain::scheduler::ready_tracker::ReadyTracker;
use crate::domain::scheduler::scheduler_type::SchedulerType;
use crate::domain::scheduler::transfer_scheduler::{NoAdvanceTransfers, TransferScheduler};
use crate::domain::scheduler::unit_priority::{UnitPriorityPolicy, UnitRanking};
use crate::domain::scheduler::unit_selector::{CostAggregation, PrioritySelector, UnitSelector};
use crate::domain::system::system::System;
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/**
 * Static list scheduler for a task DAG on a simulated multiprocessor.
 *
 * The scheduler walks simulated time tick by tick. At every tick it repeatedly offers the ready
 * tasks, in queue order, to the unit selector until a full pass places nothing, then moves on to
 * the next tick. Placements are final; the result lives in the borrowed [`System`].
 *
 * Unit selection and transfer placement are injected strategies. Without explicit configuration
 * the scheduler uses [`PrioritySelector`] and [`NoAdvanceTransfers`].
 */
#[derive(Debug)]
pub struct Scheduler<'a> {
    dag: &'a Dag,
    topology: &'a Topology,
    queue_policy: Box<dyn QueuePolicy>,
    unit_priority: Box<dyn UnitPriorityPolicy>,
    system: &'a mut System,
    router: Box<dyn Router>,
    unit_selector: Box<dyn UnitSelector>,
    transfer_scheduler: Box<dyn TransferScheduler>,
    max_ticks: Option<i64>,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        dag: &'a Dag,
        topology: &'a Topology,
        queue_policy: Box<dyn QueuePolicy>,
        unit_priority: Box<dyn UnitPriorityPolicy>,
        system: &'a mut System,
        router: Box<dyn Router>,
    ) -> Self {
        Self {
            dag,
            topology,
            queue_policy,
            unit_priority,
            system,
            router,
            unit_selector: Box::new(PrioritySelector),
            transfer_scheduler: Box::new(NoAdvanceTransfers),
            max_ticks: None,
        }
    }

    pub fn with_unit_selector(mut self, unit_selector: Box<dyn UnitSelector>) -> Self {
        self.unit_selector = unit_selector;
        self
    }

    pub fn with_transfer_scheduler(mut self, transfer_scheduler: Box<dyn TransferScheduler>) -> Self {
        self.transfer_scheduler = transfer_scheduler;
        self
    }

    /// Installs the unit selector and transfer scheduler of a named preset.
    pub fn with_preset(self, preset: SchedulerType, aggregation: CostAggregation) -> Self {
        self.with_unit_selector(preset.unit_selector().get_instance(aggregation))
            .with_transfer_scheduler(preset.transfer_scheduler().get_instance())
    }

    /// Aborts `schedule_dag` with `Error::TickLimitExceeded` once simulated time passes `max_ticks`.
    pub fn with_max_ticks(mut self, max_ticks: Option<i64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /**
     * Places every task of the DAG on the system.
     *
     * # Returns
     * `Ok(())` once every task has finished in simulated time. Errors are fatal for the run:
     * a cyclic DAG, a disconnected topology, a task found on zero or several units, the tick
     * limit, or ready tasks that no unit can ever take (`Error::Unschedulable`). The system is
     * left with every placement committed so far.
     */
    pub fn schedule_dag(&mut self) -> Result<()> {
        let queue = self.queue_policy.queue(self.dag)?;
        let ranking = UnitRanking::new(self.unit_priority.priorities(self.topology));
        let tracker = ReadyTracker::new(self.dag, queue);
        let max_ticks = self.max_ticks;
        let selector = self.unit_selector.as_ref();

        tracing::info!(
            Tasks = self.dag.node_count(),
            Units = self.system.unit_count(),
            Selector = ?selector,
            TransferScheduler = ?self.transfer_scheduler,
            "Scheduling started"
        );

        let mut ctx = SchedulingContext {
            dag: self.dag,
            system: &mut *self.system,
            router: self.router.as_ref(),
            ranking: &ranking,
            transfer_scheduler: self.transfer_scheduler.as_ref(),
        };

        let mut time = 0;
        while !tracker.done(ctx.system, time) {
            if let Some(limit) = max_ticks
                && time > limit
            {
                tracing::error!(Tick = time, Limit = limit, "Tick limit exceeded");
                return Err(Error::TickLimitExceeded(limit));
            }

            let mut placed_any = false;
            loop {
                let mut progressed = false;
                for task in tracker.ready(ctx.system, time) {
                    if place(selector, &mut ctx, time, &task)? {
                        progressed = true;
                    }
                }
                if !progressed {
                    break;
                }
                placed_any = true;
            }

            // Past the horizon every later tick sees the same timelines and the same ready set.
            if !placed_any && time >= ctx.system.horizon() {
                let stuck = tracker.ready(ctx.system, time);
                tracing::error!(Tick = time, Tasks = ?stuck, "No unit can take the ready tasks");
                return Err(Error::Unschedulable { tick: time, tasks: stuck });
            }

            time += 1;
        }

        tracing::info!(Ticks = time, Makespan = ctx.system.duration(), "Scheduling finished");
        Ok(())
    }
}

/// Places one task: choose a unit, move its inputs there, then run it.
///
/// # Returns
/// `false` if no unit is available at `time` or the chosen unit has no feasible time for the
/// task; the task is then retried on a later tick.
fn place(selector: &dyn UnitSelector, ctx: &mut SchedulingContext<'_>, time: i64, task: &NodeId) -> Result<bool> {
    ctx.system.new_session();

    let Some(unit) = selector.choose_unit(ctx, time, task)? else {
        return Ok(false);
    };

    let transfer_scheduler = ctx.transfer_scheduler;
    let weight = ctx.weight(task)?;

    let placed = match transfer_scheduler.schedule_transfers(ctx, time, task, &unit) {
        Ok(ready) => ctx.system.schedule_calculation(task, ready, weight, &unit),
        Err(err) => Err(err),
    };

    match placed {
        Ok(calc) => {
            ctx.system.new_session();
            tracing::debug!(Tick = time, Task = %task, Unit = %unit, Start = calc.start, End = calc.end, "Task placed");
            Ok(true)
        }
        Err(Error::NoFeasibleTime { unit: blocked, from }) => {
            ctx.system.cancel_session();
            tracing::debug!(Tick = time, Task = %task, Unit = %unit, Blocked = %blocked, Since = from, "Task deferred");
            Ok(false)
        }
        Err(err) => {
            ctx.system.cancel_session();
            tracing::error!(Tick = time, Task = %task, Unit = %unit, Error = %err, "Task placement failed");
            Err(err)
        }
    }
}
