use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt::Debug;

use crate::domain::graph::graph::{Topology, Traversal};
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// A route as consecutive (hop source, hop target) unit pairs. Empty iff source and target coincide.
pub type Route = Vec<(NodeId, NodeId)>;

/// Finds a path between two units of the topology.
pub trait Router: Debug {
    /// Route from `source` to `target` for a transfer starting at `time`.
    ///
    /// Topologies are static, so current implementations ignore `time`.
    ///
    /// # Returns
    /// An empty route if `source == target`, `Error::NoRoute` if the units are not connected.
    fn route(&self, time: i64, source: &NodeId, target: &NodeId) -> Result<Route>;
}

fn to_hops(path: &[NodeId]) -> Route {
    path.windows(2).map(|pair| (pair[0].clone(), pair[1].clone())).collect()
}

fn check_units(adjacency: &BTreeMap<NodeId, Vec<NodeId>>, source: &NodeId, target: &NodeId) -> Result<()> {
    for unit in [source, target] {
        if !adjacency.contains_key(unit) {
            return Err(Error::UnknownUnit(unit.clone()));
        }
    }
    Ok(())
}

/// Depth first search returning the first path it discovers, neighbours taken in edge order.
#[derive(Debug, Clone)]
pub struct DfsRouter {
    adjacency: BTreeMap<NodeId, Vec<NodeId>>,
}

impl DfsRouter {
    pub fn new(topology: &Topology) -> Self {
        Self { adjacency: topology.adjacency(Traversal::Forward) }
    }

    fn find_path(&self, source: &NodeId, target: &NodeId) -> Option<Vec<NodeId>> {
        let mut visited: BTreeSet<NodeId> = BTreeSet::new();
        visited.insert(source.clone());

        // Current path plus, per path node, the index of the next neighbour to try.
        let mut path: Vec<NodeId> = vec![source.clone()];
        let mut next: Vec<usize> = vec![0];

        while let Some(node) = path.last() {
            if node == target {
                return Some(path);
            }

            let neighbours = self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[]);
            let cursor = next.last_mut()?;

            match neighbours[*cursor..].iter().position(|candidate| !visited.contains(candidate)) {
                Some(offset) => {
                    let candidate = neighbours[*cursor + offset].clone();
                    *cursor += offset + 1;
                    visited.insert(candidate.clone());
                    path.push(candidate);
                    next.push(0);
                }
                None => {
                    path.pop();
                    next.pop();
                }
            }
        }

        None
    }
}

impl Router for DfsRouter {
    fn route(&self, _time: i64, source: &NodeId, target: &NodeId) -> Result<Route> {
        check_units(&self.adjacency, source, target)?;

        match self.find_path(source, target) {
            Some(path) => Ok(to_hops(&path)),
            None => {
                log::error!("No route between units {} and {}", source, target);
                Err(Error::NoRoute { from: source.clone(), to: target.clone() })
            }
        }
    }
}

/// Breadth first search returning a path with the fewest hops.
#[derive(Debug, Clone)]
pub struct ShortestPathRouter {
    adjacency: BTreeMap<NodeId, Vec<NodeId>>,
}

impl ShortestPathRouter {
    pub fn new(topology: &Topology) -> Self {
        Self { adjacency: topology.adjacency(Traversal::Forward) }
    }

    fn find_path(&self, source: &NodeId, target: &NodeId) -> Option<Vec<NodeId>> {
        let mut parents: HashMap<NodeId, NodeId> = HashMap::new();
        let mut queue: VecDeque<NodeId> = VecDeque::from([source.clone()]);
        let mut visited: BTreeSet<NodeId> = BTreeSet::from([source.clone()]);

        while let Some(node) = queue.pop_front() {
            if &node == target {
                let mut path = vec![node];
                while let Some(parent) = path.last().and_then(|last| parents.get(last)) {
                    path.push(parent.clone());
                }
                path.reverse();
                return Some(path);
            }

            for neighbour in self.adjacency.get(&node).into_iter().flatten() {
                if visited.insert(neighbour.clone()) {
                    parents.insert(neighbour.clone(), node.clone());
                    queue.push_back(neighbour.clone());
                }
            }
        }

        None
    }
}

impl Router for ShortestPathRouter {
    fn route(&self, _time: i64, source: &NodeId, target: &NodeId) -> Result<Route> {
        check_units(&self.adjacency, source, target)?;

        self.find_path(source, target)
            .map(|path| to_hops(&path))
            .ok_or_else(|| Error::NoRoute { from: source.clone(), to: target.clone() })
    }
}
