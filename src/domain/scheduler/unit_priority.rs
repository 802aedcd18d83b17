use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt::Debug;
use std::str::FromStr;

use crate::domain::graph::graph::Topology;
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// Orders the units of a topology; earlier units win ties between equally good candidates.
pub trait UnitPriorityPolicy: Debug {
    fn priorities(&self, topology: &Topology) -> Vec<NodeId>;
}

/// Best connected units first: descending degree, ties by descending id.
#[derive(Debug, Clone, Copy, Default)]
pub struct CohesionPriority;

impl UnitPriorityPolicy for CohesionPriority {
    fn priorities(&self, topology: &Topology) -> Vec<NodeId> {
        let mut ranked: Vec<(usize, NodeId)> = topology.node_ids().map(|id| (topology.degree(id), id.clone())).collect();
        ranked.sort_by_key(|(degree, id)| Reverse((*degree, id.clone())));
        ranked.into_iter().map(|(_, id)| id).collect()
    }
}

/// Rank lookup over a priority order.
#[derive(Debug, Clone, Default)]
pub struct UnitRanking {
    order: Vec<NodeId>,
    rank: HashMap<NodeId, usize>,
}

impl UnitRanking {
    pub fn new(order: Vec<NodeId>) -> Self {
        let rank = order.iter().enumerate().map(|(index, id)| (id.clone(), index)).collect();
        Self { order, rank }
    }

    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Position in the order; unknown units rank after every known one.
    pub fn rank(&self, unit: &NodeId) -> usize {
        self.rank.get(unit).copied().unwrap_or(usize::MAX)
    }

    /// The highest priority unit among `candidates`.
    pub fn pick<'c>(&self, candidates: impl IntoIterator<Item = &'c NodeId>) -> Option<NodeId> {
        candidates.into_iter().min_by_key(|unit| (self.rank(unit), (*unit).clone())).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitPriorityType {
    Cohesion,
}

impl UnitPriorityType {
    pub fn get_instance(self) -> Box<dyn UnitPriorityPolicy> {
        match self {
            UnitPriorityType::Cohesion => Box::new(CohesionPriority),
        }
    }
}

impl FromStr for UnitPriorityType {
    type Err = Error;

    fn from_str(name: &str) -> Result<UnitPriorityType> {
        match name.to_ascii_lowercase().as_str() {
            "cohesion" => Ok(UnitPriorityType::Cohesion),
            _ => Err(Error::UnknownPolicy(format!("unit priority '{}'", name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> NodeId {
        NodeId::new(value)
    }

    /// Star around B, plus C-D.
    fn topology() -> Topology {
        let mut topology = Topology::new();
        for name in ["A", "B", "C", "D"] {
            topology.add_node(0.0, 0.0, 1, Some(id(name))).unwrap();
        }
        topology.add_edge("B", "A", 1).unwrap();
        topology.add_edge("B", "C", 1).unwrap();
        topology.add_edge("B", "D", 1).unwrap();
        topology.add_edge("C", "D", 1).unwrap();
        topology
    }

    #[test]
    fn cohesion_prefers_high_degree_then_high_id() {
        let order = CohesionPriority.priorities(&topology());

        assert_eq!(order, vec![id("B"), id("D"), id("C"), id("A")]);
    }

    #[test]
    fn ranking_picks_best_candidate() {
        let ranking = UnitRanking::new(CohesionPriority.priorities(&topology()));

        assert_eq!(ranking.pick(&[id("A"), id("C")]), Some(id("C")));
        assert_eq!(ranking.pick(&[id("Z"), id("A")]), Some(id("A")));
        assert_eq!(ranking.pick(std::iter::empty()), None);
    }
}
