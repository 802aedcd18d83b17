use std::cmp::Reverse;
use std::fmt::Debug;
use std::str::FromStr;

use crate::domain::graph::analytics::{PathMetric, find_all_critical_paths};
use crate::domain::graph::graph::{Dag, Traversal};
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// Orders the tasks of a DAG by scheduling priority.
pub trait QueuePolicy: Debug {
    /// Every task id exactly once, highest priority first.
    fn queue(&self, dag: &Dag) -> Result<Vec<NodeId>>;
}

/// Descending weight of the longest path down to a sink, ties by descending id.
#[derive(Debug, Clone, Copy, Default)]
pub struct DownwardWeightQueue;

impl QueuePolicy for DownwardWeightQueue {
    fn queue(&self, dag: &Dag) -> Result<Vec<NodeId>> {
        let paths = find_all_critical_paths(dag, Traversal::Forward, PathMetric::Weight)?;

        let mut ranked: Vec<(i64, NodeId)> = paths.into_iter().map(|(id, path)| (path.value, id)).collect();
        ranked.sort_by(|a, b| b.cmp(a));
        Ok(ranked.into_iter().map(|(_, id)| id).collect())
    }
}

/// Descending hop count of the longest path down to a sink, ties by descending degree, then by id.
#[derive(Debug, Clone, Copy, Default)]
pub struct DownwardHopCountQueue;

impl QueuePolicy for DownwardHopCountQueue {
    fn queue(&self, dag: &Dag) -> Result<Vec<NodeId>> {
        let paths = find_all_critical_paths(dag, Traversal::Forward, PathMetric::HopCount)?;

        let mut ranked: Vec<(i64, usize, NodeId)> = paths.into_iter().map(|(id, path)| (path.value, dag.degree(&id), id)).collect();
        ranked.sort_by_key(|(hops, degree, id)| (Reverse(*hops), Reverse(*degree), id.clone()));
        Ok(ranked.into_iter().map(|(_, _, id)| id).collect())
    }
}

/// Ascending weight of the longest path up to a source, ties by id.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpwardWeightQueue;

impl QueuePolicy for UpwardWeightQueue {
    fn queue(&self, dag: &Dag) -> Result<Vec<NodeId>> {
        let paths = find_all_critical_paths(dag, Traversal::Backward, PathMetric::Weight)?;

        let mut ranked: Vec<(i64, NodeId)> = paths.into_iter().map(|(id, path)| (path.value, id)).collect();
        ranked.sort();
        Ok(ranked.into_iter().map(|(_, id)| id).collect())
    }
}

/// Ascending slack: how much shorter the longest path through a task is than the critical path.
/// Critical tasks (slack zero) come first, ties by id.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlackQueue;

impl QueuePolicy for SlackQueue {
    fn queue(&self, dag: &Dag) -> Result<Vec<NodeId>> {
        let downward = find_all_critical_paths(dag, Traversal::Forward, PathMetric::Weight)?;
        let upward = find_all_critical_paths(dag, Traversal::Backward, PathMetric::Weight)?;
        let critical = downward.values().map(|path| path.value).max().unwrap_or(0);

        let mut ranked: Vec<(i64, NodeId)> = Vec::with_capacity(downward.len());
        for (id, down) in &downward {
            let up = upward.get(id).map_or(0, |path| path.value);
            let weight = dag.node(id).map_or(0, |node| node.weight);
            // Both directions include the task itself.
            let through = down.value + up - weight;
            ranked.push((critical - through, id.clone()));
        }

        ranked.sort();
        Ok(ranked.into_iter().map(|(_, id)| id).collect())
    }
}

/// Available task queue policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePolicyType {
    DownwardWeight,
    DownwardHopCount,
    UpwardWeight,
    Slack,
}

impl QueuePolicyType {
    /// Factory method to return the policy for the variant.
    pub fn get_instance(self) -> Box<dyn QueuePolicy> {
        match self {
            QueuePolicyType::DownwardWeight => Box::new(DownwardWeightQueue),
            QueuePolicyType::DownwardHopCount => Box::new(DownwardHopCountQueue),
            QueuePolicyType::UpwardWeight => Box::new(UpwardWeightQueue),
            QueuePolicyType::Slack => Box::new(SlackQueue),
        }
    }
}

impl FromStr for QueuePolicyType {
    type Err = Error;

    fn from_str(name: &str) -> Result<QueuePolicyType> {
        match name.to_ascii_lowercase().as_str() {
            "critical-path-weight" | "downward-weight" => Ok(QueuePolicyType::DownwardWeight),
            "critical-path-hops" | "downward-hops" => Ok(QueuePolicyType::DownwardHopCount),
            "upward-weight" => Ok(QueuePolicyType::UpwardWeight),
            "slack" => Ok(QueuePolicyType::Slack),
            _ => Err(Error::UnknownPolicy(format!("queue policy '{}'", name))),
        }
    }
}
