use crate::api::run_config_dto::RunConfigDto;
use crate::domain::graph::analytics::is_connected;
use crate::domain::graph::graph::{Dag, Topology};
use crate::domain::scheduler::settings::SchedulerSettings;
use crate::domain::system::system::System;
use crate::domain::utils::statistics::{ScheduleMetrics, write_timeline_file};
use crate::error::{Error, Result};
use crate::loader::parser::load_graph;

pub mod api;
pub mod cli;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// A finished scheduling run together with its inputs.
#[derive(Debug)]
pub struct ScheduleOutcome {
    pub dag: Dag,
    pub topology: Topology,
    pub settings: SchedulerSettings,
    pub system: System,
    pub metrics: ScheduleMetrics,
}

/// Loads the DAG and topology named by `config`, schedules the DAG and, if configured, writes
/// the resulting timelines as CSV.
pub fn schedule_from_files(config: &RunConfigDto) -> Result<ScheduleOutcome> {
    let dag_path = config.dag.as_deref().ok_or(Error::MissingInput("dag"))?;
    let topology_path = config.topology.as_deref().ok_or(Error::MissingInput("topology"))?;
    let settings = SchedulerSettings::from_dto(config)?;

    let dag: Dag = load_graph(dag_path, None)?;
    let topology: Topology = load_graph(topology_path, None)?;
    log::info!("Loaded DAG '{}' ({} tasks) and topology '{}' ({} units).", dag_path, dag.node_count(), topology_path, topology.node_count());

    if !dag.is_empty() && topology.is_empty() {
        log::error!("Topology '{}' has no units to run {} tasks on.", topology_path, dag.node_count());
        return Err(Error::EmptyTopology);
    }

    if dag.edge_count() > 0 && !is_connected(&topology) {
        log::error!("Topology '{}' is not connected, transfers between its components are impossible.", topology_path);
        return Err(Error::DisconnectedTopology);
    }

    let system = settings.schedule(&dag, &topology)?;
    let metrics = ScheduleMetrics::new(&dag, &system);
    log::info!("Makespan {}, speed-up {:.3}, efficiency {:.3}.", metrics.makespan, metrics.speed_up, metrics.efficiency);

    if let Some(path) = &config.csv_output {
        write_timeline_file(&system, path)?;
    }

    Ok(ScheduleOutcome { dag, topology, settings, system, metrics })
}
