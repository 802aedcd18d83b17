use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::graph::graph::{Directedness, Graph, Traversal};
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// What a node contributes to the length of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMetric {
    /// Sum of node weights.
    Weight,
    /// Number of nodes on the path.
    HopCount,
}

/// Best path starting at a node together with its accumulated value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct CriticalPath {
    pub value: i64,
    pub path: Vec<NodeId>,
}

/// Walks the spanning tree from `node` up to `ancestor` and returns the cycle closed by the
/// edge `node -> ancestor`, starting at the ancestor. Empty if `ancestor` is not above `node`.
fn cycle_to_ancestor(spanning_tree: &HashMap<NodeId, Option<NodeId>>, node: &NodeId, ancestor: &NodeId) -> Vec<NodeId> {
    let mut path = Vec::new();
    let mut current = node.clone();

    while &current != ancestor {
        path.push(current.clone());
        match spanning_tree.get(&current).cloned().flatten() {
            Some(parent) => current = parent,
            None => return Vec::new(),
        }
    }

    path.push(current);
    path.reverse();
    path
}

/// Finds cycles with a depth first search over the graph's neighbour relation.
///
/// Every edge leading back to a node on the current search path yields one cycle. For a
/// directed graph the result is empty iff the graph is acyclic. In an undirected graph the
/// edge back to the search parent is the tree edge itself and is skipped.
pub fn find_all_cycles<D: Directedness>(graph: &Graph<D>) -> Vec<Vec<NodeId>> {
    let adjacency = graph.adjacency(Traversal::Forward);
    let mut visited: BTreeSet<NodeId> = BTreeSet::new();
    let mut spanning_tree: HashMap<NodeId, Option<NodeId>> = HashMap::new();
    let mut cycles = Vec::new();

    for root in graph.node_ids() {
        if visited.contains(root) {
            continue;
        }

        spanning_tree.insert(root.clone(), None);
        visited.insert(root.clone());

        // Frames hold the node and the index of the next neighbour to inspect.
        let mut stack: Vec<(NodeId, usize)> = vec![(root.clone(), 0)];

        while let Some((node, next)) = stack.last_mut() {
            let neighbours = adjacency.get(node).map(Vec::as_slice).unwrap_or(&[]);

            let Some(neighbour) = neighbours.get(*next).cloned() else {
                stack.pop();
                continue;
            };
            *next += 1;
            let node = node.clone();

            if !visited.contains(&neighbour) {
                visited.insert(neighbour.clone());
                spanning_tree.insert(neighbour.clone(), Some(node));
                stack.push((neighbour, 0));
                continue;
            }

            let is_tree_edge = !D::DIRECTED && spanning_tree.get(&node).cloned().flatten().as_ref() == Some(&neighbour);
            if !is_tree_edge {
                let cycle = cycle_to_ancestor(&spanning_tree, &node, &neighbour);
                if !cycle.is_empty() {
                    log::trace!("Found cycle {:?}", cycle);
                    cycles.push(cycle);
                }
            }
        }
    }

    cycles
}

/// True iff every node is reachable from the first one, ignoring edge direction.
pub fn is_connected<D: Directedness>(graph: &Graph<D>) -> bool {
    let Some(start) = graph.node_ids().next() else {
        return true;
    };

    let mut neighbours = graph.adjacency(Traversal::Forward);
    if D::DIRECTED {
        for (id, predecessors) in graph.adjacency(Traversal::Backward) {
            neighbours.entry(id).or_default().extend(predecessors);
        }
    }

    let mut visited: BTreeSet<NodeId> = BTreeSet::new();
    let mut stack = vec![start.clone()];

    while let Some(node) = stack.pop() {
        if !visited.insert(node.clone()) {
            continue;
        }
        for neighbour in neighbours.get(&node).into_iter().flatten() {
            if !visited.contains(neighbour) {
                stack.push(neighbour.clone());
            }
        }
    }

    visited.len() == graph.node_count()
}

/// Computes, for every node, the most expensive path starting at it in the given direction.
///
/// Each node takes the neighbour with the largest accumulated value (the first one on ties,
/// `(0, [])` without neighbours) and adds its own contribution: its weight for
/// `PathMetric::Weight`, one for `PathMetric::HopCount`. Results are memoized per node and
/// computed with an explicit stack, so deep graphs do not exhaust the call stack.
///
/// Fails with `Error::CyclicGraph` if a cycle is reachable in the chosen direction.
pub fn find_all_critical_paths<D: Directedness>(
    graph: &Graph<D>,
    traversal: Traversal,
    metric: PathMetric,
) -> Result<BTreeMap<NodeId, CriticalPath>> {
    let adjacency = graph.adjacency(traversal);
    let mut results: BTreeMap<NodeId, CriticalPath> = BTreeMap::new();
    let mut in_progress: BTreeSet<NodeId> = BTreeSet::new();

    for root in graph.node_ids() {
        if results.contains_key(root) {
            continue;
        }

        let mut stack: Vec<(NodeId, bool)> = vec![(root.clone(), false)];

        while let Some((id, expanded)) = stack.pop() {
            if results.contains_key(&id) {
                continue;
            }

            let neighbours = adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[]);

            if !expanded {
                in_progress.insert(id.clone());
                stack.push((id.clone(), true));

                for neighbour in neighbours.iter().rev() {
                    if results.contains_key(neighbour) {
                        continue;
                    }
                    if in_progress.contains(neighbour) {
                        return Err(Error::CyclicGraph(vec![neighbour.clone(), id.clone()]));
                    }
                    stack.push((neighbour.clone(), false));
                }
                continue;
            }

            let mut best: Option<&CriticalPath> = None;
            for neighbour in neighbours {
                if let Some(candidate) = results.get(neighbour) {
                    if best.is_none_or(|current| candidate.value > current.value) {
                        best = Some(candidate);
                    }
                }
            }

            let contribution = match metric {
                PathMetric::Weight => graph.node(&id).map(|node| node.weight).unwrap_or(0),
                PathMetric::HopCount => 1,
            };

            let mut path = Vec::with_capacity(best.map_or(0, |best| best.path.len()) + 1);
            path.push(id.clone());
            let mut value = contribution;
            if let Some(best) = best {
                path.extend(best.path.iter().cloned());
                value += best.value;
            }

            in_progress.remove(&id);
            results.insert(id, CriticalPath { value, path });
        }
    }

    Ok(results)
}

/// The overall critical path: the largest `(value, path)` over all nodes.
pub fn find_critical_path<D: Directedness>(graph: &Graph<D>, traversal: Traversal, metric: PathMetric) -> Result<CriticalPath> {
    let all_paths = find_all_critical_paths(graph, traversal, metric)?;
    Ok(all_paths.into_values().max().unwrap_or_default())
}
