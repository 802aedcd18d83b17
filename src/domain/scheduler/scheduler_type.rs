use std::str::FromStr;

use crate::domain::scheduler::transfer_scheduler::TransferSchedulerType;
use crate::domain::scheduler::unit_selector::UnitSelectorType;
use crate::error::{Error, Result};

/// Named combinations of unit selector and transfer scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerType {
    /// Highest priority free unit, transfers start at the consumer's tick.
    Dummy,
    /// Cheapest estimated traffic, transfers start at the consumer's tick.
    Neighbour,
    /// Cheapest estimated traffic, transfers start when the producer finishes.
    AdvanceNeighbour,
    /// Earliest start found by trial placement on every unit, transfers start when the producer
    /// finishes.
    ModellingNeighbour,
}

impl SchedulerType {
    pub fn unit_selector(self) -> UnitSelectorType {
        match self {
            SchedulerType::Dummy => UnitSelectorType::Priority,
            SchedulerType::Neighbour | SchedulerType::AdvanceNeighbour => UnitSelectorType::NearestTransfer,
            SchedulerType::ModellingNeighbour => UnitSelectorType::Modelling,
        }
    }

    pub fn transfer_scheduler(self) -> TransferSchedulerType {
        match self {
            SchedulerType::Dummy | SchedulerType::Neighbour => TransferSchedulerType::NoAdvance,
            SchedulerType::AdvanceNeighbour | SchedulerType::ModellingNeighbour => TransferSchedulerType::Advance,
        }
    }
}

impl FromStr for SchedulerType {
    type Err = Error;

    fn from_str(name: &str) -> Result<SchedulerType> {
        match name.to_ascii_lowercase().as_str() {
            "dummy" => Ok(SchedulerType::Dummy),
            "neighbour" => Ok(SchedulerType::Neighbour),
            "advance-neighbour" => Ok(SchedulerType::AdvanceNeighbour),
            "modelling-neighbour" => Ok(SchedulerType::ModellingNeighbour),
            _ => Err(Error::UnknownPolicy(format!("scheduler '{}'", name))),
        }
    }
}
