use rand::Rng;
use rand::seq::IndexedRandom;

use crate::domain::graph::graph::Dag;
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// Shape of a synthetic task DAG.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorParams {
    pub min_weight: i64,
    pub max_weight: i64,
    pub count: usize,

    /// Targeted share of computation in the total work, see [`Dag::correlation`]. Must lie in (0, 1].
    pub connectivity: f64,

    /// Percentage of all `count * (count - 1) / 2` forward pairs that become edges.
    pub connections_percent: f64,

    pub min_edge_weight: i64,
    pub max_edge_weight: i64,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self { min_weight: 5, max_weight: 20, count: 16, connectivity: 0.5, connections_percent: 30.0, min_edge_weight: 1, max_edge_weight: 9999 }
    }
}

impl GeneratorParams {
    fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(Error::InvalidGeneratorParameters("count must be positive".to_string()));
        }
        if self.min_weight < 0 || self.min_weight > self.max_weight {
            return Err(Error::InvalidGeneratorParameters(format!("invalid node weight range {}..={}", self.min_weight, self.max_weight)));
        }
        if self.min_edge_weight < 1 || self.min_edge_weight > self.max_edge_weight {
            return Err(Error::InvalidGeneratorParameters(format!(
                "invalid edge weight range {}..={}",
                self.min_edge_weight, self.max_edge_weight
            )));
        }
        if !(self.connectivity > 0.0 && self.connectivity <= 1.0) {
            return Err(Error::InvalidGeneratorParameters(format!("connectivity {} outside (0, 1]", self.connectivity)));
        }
        if !(0.0..=100.0).contains(&self.connections_percent) {
            return Err(Error::InvalidGeneratorParameters(format!("connections percent {} outside [0, 100]", self.connections_percent)));
        }
        Ok(())
    }
}

/// A generated DAG plus the clamping notices collected while distributing the edge weight budget.
#[derive(Debug, Clone)]
pub struct GeneratedDag {
    pub dag: Dag,
    pub notices: Vec<String>,
}

/// Clamps a sampled edge weight into `[min, max]`. An average above `max` disables the upper bound.
fn norm_weight(weight: i64, min: i64, max: i64, average: f64) -> i64 {
    if weight < min {
        min
    } else if average > max as f64 {
        weight
    } else {
        weight.min(max)
    }
}

/// Standard normal sample (Box-Muller).
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Generates a random DAG whose node/edge weight ratio approximates `params.connectivity`.
///
/// Nodes are named "0".."count-1" and edges only run from lower to higher index, so the
/// result is acyclic. Edge weights are drawn around the remaining budget per edge; whenever
/// the budget cannot be honoured exactly a notice is recorded instead of failing.
pub fn generate_dag<R: Rng>(params: &GeneratorParams, rng: &mut R) -> Result<GeneratedDag> {
    params.validate()?;

    let mut dag = Dag::new();
    let mut notices = Vec::new();

    let mut sum_weight: i64 = 0;
    for index in 0..params.count {
        let weight = rng.random_range(params.min_weight..=params.max_weight);
        let x = rng.random_range(0..=300) as f64;
        let y = rng.random_range(0..=300) as f64;
        dag.add_node(x, y, weight, Some(NodeId::new(index.to_string())))?;
        sum_weight += weight;
    }

    let budget = (sum_weight as f64 - params.connectivity * sum_weight as f64) / params.connectivity;

    let max_edges_count = params.count * (params.count - 1) / 2;
    let edges_count = (params.connections_percent / 100.0 * max_edges_count as f64) as usize;

    let pairs: Vec<(usize, usize)> = (0..params.count).flat_map(|i| (i + 1..params.count).map(move |j| (i, j))).collect();
    let chosen: Vec<(usize, usize)> = pairs.choose_multiple(&mut *rng, edges_count).cloned().collect();

    let mut edges: Vec<(usize, usize, i64)> = Vec::with_capacity(chosen.len());
    let mut spent: f64 = 0.0;
    let mut exhausted = false;

    for (added, &(source, target)) in chosen.iter().enumerate() {
        let average = f64::max(1.0, (budget - spent) / (edges_count - added) as f64);
        let sampled = (average + average / 4.0 * standard_normal(rng)) as i64;
        let mut weight = norm_weight(sampled, params.min_edge_weight, params.max_edge_weight, average);

        if budget - (spent + weight as f64) < 0.0 {
            weight = i64::max(1, (budget - spent) as i64);
            edges.push((source, target, weight));
            notices.push(format!(
                "Stopped, maximum reached: last edge weight was {} < {} < {}",
                params.min_edge_weight, weight, params.max_edge_weight
            ));
            exhausted = true;
            break;
        }

        edges.push((source, target, weight));
        spent += weight as f64;
    }

    // The last edge absorbs what is left of the budget.
    if !exhausted {
        if let Some(last) = edges.last_mut() {
            let remainder = (budget - spent) as i64;
            let weight = i64::max(1, last.2 + remainder);
            if weight < params.min_edge_weight || weight > params.max_edge_weight {
                notices.push(format!(
                    "Last edge weight was out of bounds {} < {} < {}",
                    params.min_edge_weight, weight, params.max_edge_weight
                ));
            }
            last.2 = weight;
        }
    }

    for (source, target, weight) in edges {
        dag.add_edge(source.to_string().as_str(), target.to_string().as_str(), weight)?;
    }

    for notice in &notices {
        log::warn!("{}", notice);
    }

    dag.arrange()?;
    Ok(GeneratedDag { dag, notices })
}
