use rand::Rng;
use serde::Serialize;

use crate::domain::graph::generator::{GeneratorParams, generate_dag};
use crate::domain::graph::graph::Topology;
use crate::domain::scheduler::settings::SchedulerSettings;
use crate::domain::utils::statistics::ScheduleMetrics;
use crate::error::{Error, Result};

/// Sweep over DAG connectivity on a fixed topology.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    pub settings: SchedulerSettings,

    /// Template for the generated DAGs. `count` and `connectivity` are overwritten per run.
    pub generator: GeneratorParams,

    /// Tasks per unit in every generated DAG.
    pub scale: usize,

    /// DAGs generated and scheduled per connectivity value.
    pub samples: usize,
    pub connectivities: Vec<f64>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            settings: SchedulerSettings::default(),
            generator: GeneratorParams::default(),
            scale: 1,
            samples: 10,
            connectivities: (1..10).map(|step| step as f64 / 10.0).collect(),
        }
    }
}

/// Averages over the samples of one connectivity value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkPoint {
    pub connectivity: f64,
    pub speed_up: f64,
    pub efficiency: f64,
    pub samples: usize,
}

/// Generates `samples` DAGs per connectivity value, schedules each on a fresh system over
/// `topology` and averages speed-up and efficiency.
pub fn run_benchmark<R: Rng>(topology: &Topology, config: &BenchmarkConfig, rng: &mut R) -> Result<Vec<BenchmarkPoint>> {
    if config.samples == 0 {
        return Err(Error::InvalidGeneratorParameters("samples must be positive".to_string()));
    }

    let task_count = topology.node_count() * config.scale;
    let mut points = Vec::with_capacity(config.connectivities.len());

    for &connectivity in &config.connectivities {
        let params = GeneratorParams { count: task_count, connectivity, ..config.generator.clone() };
        let mut speed_up = 0.0;
        let mut efficiency = 0.0;

        for sample in 0..config.samples {
            let generated = generate_dag(&params, rng)?;
            let system = config.settings.schedule(&generated.dag, topology)?;
            let metrics = ScheduleMetrics::new(&generated.dag, &system);

            log::debug!(
                "Connectivity {:.2}, sample {}: makespan {}, speed-up {:.3}",
                connectivity,
                sample,
                metrics.makespan,
                metrics.speed_up
            );
            speed_up += metrics.speed_up;
            efficiency += metrics.efficiency;
        }

        let point = BenchmarkPoint {
            connectivity,
            speed_up: speed_up / config.samples as f64,
            efficiency: efficiency / config.samples as f64,
            samples: config.samples,
        };
        log::info!("Connectivity {:.2}: speed-up {:.3}, efficiency {:.3}", point.connectivity, point.speed_up, point.efficiency);
        points.push(point);
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::domain::scheduler::scheduler_type::SchedulerType;
    use crate::domain::utils::id::NodeId;

    fn ring(count: usize) -> Topology {
        let mut topology = Topology::new();
        for index in 0..count {
            topology.add_node(0.0, 0.0, 2, Some(NodeId::new(format!("u{}", index)))).unwrap();
        }
        for index in 0..count {
            topology.add_edge(format!("u{}", index).as_str(), format!("u{}", (index + 1) % count).as_str(), 1).unwrap();
        }
        topology
    }

    fn config(preset: SchedulerType) -> BenchmarkConfig {
        BenchmarkConfig {
            settings: SchedulerSettings::from_preset(preset),
            generator: GeneratorParams { max_edge_weight: 30, ..GeneratorParams::default() },
            scale: 2,
            samples: 2,
            connectivities: vec![0.3, 0.8],
        }
    }

    #[test]
    fn benchmark_reports_one_point_per_connectivity() {
        let topology = ring(4);
        let mut rng = StdRng::seed_from_u64(7);

        let points = run_benchmark(&topology, &config(SchedulerType::AdvanceNeighbour), &mut rng).unwrap();

        assert_eq!(points.len(), 2);
        for point in points {
            assert_eq!(point.samples, 2);
            assert!(point.speed_up > 0.0);
            assert!((point.efficiency - point.speed_up / 4.0).abs() < 1e-9);
        }
    }

    #[test]
    fn benchmark_is_reproducible_with_same_seed() {
        let topology = ring(3);

        let first = run_benchmark(&topology, &config(SchedulerType::ModellingNeighbour), &mut StdRng::seed_from_u64(11)).unwrap();
        let second = run_benchmark(&topology, &config(SchedulerType::ModellingNeighbour), &mut StdRng::seed_from_u64(11)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn zero_samples_is_rejected() {
        let mut empty = config(SchedulerType::Dummy);
        empty.samples = 0;

        assert!(matches!(run_benchmark(&ring(2), &empty, &mut StdRng::seed_from_u64(1)), Err(Error::InvalidGeneratorParameters(_))));
    }
}
