use crate::api::run_config_dto::RunConfigDto;
use crate::domain::graph::graph::{Dag, Topology};
use crate::domain::routing::router_type::RouterType;
use crate::domain::scheduler::queue_policy::QueuePolicyType;
use crate::domain::scheduler::scheduler::Scheduler;
use crate::domain::scheduler::scheduler_type::SchedulerType;
use crate::domain::scheduler::transfer_scheduler::TransferSchedulerType;
use crate::domain::scheduler::unit_priority::UnitPriorityType;
use crate::domain::scheduler::unit_selector::{CostAggregation, UnitSelectorType};
use crate::domain::system::system::System;
use crate::error::Result;

/// Fully resolved choice of policies and system parameters for one scheduling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub queue_policy: QueuePolicyType,
    pub unit_priority: UnitPriorityType,
    pub unit_selector: UnitSelectorType,
    pub transfer_scheduler: TransferSchedulerType,
    pub aggregation: CostAggregation,
    pub router: RouterType,
    pub duplex: bool,
    pub has_io_cpu: bool,
    pub max_ticks: Option<i64>,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from_preset(SchedulerType::Dummy)
    }
}

impl SchedulerSettings {
    pub fn from_preset(preset: SchedulerType) -> Self {
        Self {
            queue_policy: QueuePolicyType::DownwardWeight,
            unit_priority: UnitPriorityType::Cohesion,
            unit_selector: preset.unit_selector(),
            transfer_scheduler: preset.transfer_scheduler(),
            aggregation: CostAggregation::Sum,
            router: RouterType::Dfs,
            duplex: false,
            has_io_cpu: true,
            max_ticks: None,
        }
    }

    /// Parses every policy name of `dto`. Fails with `Error::UnknownPolicy` on the first unknown name.
    pub fn from_dto(dto: &RunConfigDto) -> Result<Self> {
        let preset: SchedulerType = dto.scheduler.parse()?;

        let unit_selector = match &dto.unit_selector {
            Some(name) => name.parse()?,
            None => preset.unit_selector(),
        };
        let transfer_scheduler = match &dto.transfer_scheduler {
            Some(name) => name.parse()?,
            None => preset.transfer_scheduler(),
        };

        Ok(Self {
            queue_policy: dto.queue_policy.parse()?,
            unit_priority: dto.unit_priority.parse()?,
            unit_selector,
            transfer_scheduler,
            aggregation: dto.cost_aggregation.parse()?,
            router: dto.router.parse()?,
            duplex: dto.duplex,
            has_io_cpu: dto.has_io_cpu,
            max_ticks: dto.max_ticks,
        })
    }

    /// An empty system over `topology` with these link and IO settings.
    pub fn build_system(&self, topology: &Topology) -> System {
        System::new(topology, self.duplex, self.has_io_cpu)
    }

    /// Schedules `dag` on a fresh system over `topology`.
    pub fn schedule(&self, dag: &Dag, topology: &Topology) -> Result<System> {
        let mut system = self.build_system(topology);

        Scheduler::new(
            dag,
            topology,
            self.queue_policy.get_instance(),
            self.unit_priority.get_instance(),
            &mut system,
            self.router.get_instance(topology),
        )
        .with_unit_selector(self.unit_selector.get_instance(self.aggregation))
        .with_transfer_scheduler(self.transfer_scheduler.get_instance())
        .with_max_ticks(self.max_ticks)
        .schedule_dag()?;

        Ok(system)
    }
}
