use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::marker::PhantomData;

use crate::api::graph_dto::{EdgeDto, GraphDto, NodeDto, NodeOverrideDto};
use crate::domain::utils::id::{GraphId, NodeId};
use crate::error::{Error, Result};

/// Marker trait selecting the neighbour semantics of a [`Graph`].
pub trait Directedness: Debug + Clone + Copy + Default + PartialEq {
    const DIRECTED: bool;
}

/// Task graphs: edges point from producer to consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Directed;

/// System topologies: every edge is a bidirectional connection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Undirected;

impl Directedness for Directed {
    const DIRECTED: bool = true;
}

impl Directedness for Undirected {
    const DIRECTED: bool = false;
}

/// Direction of a neighbour query. Undirected graphs ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Traversal {
    /// Successors (edge sources equal to the node).
    Forward,
    /// Predecessors (edge targets equal to the node).
    Backward,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,

    /// Layout coordinates, only used for presentation.
    pub x: f64,
    pub y: f64,

    /// Execution cost for tasks, number of links for topology nodes.
    pub weight: i64,
}

/// Edges reference their endpoints by id; the owning [`Graph`] resolves them.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,

    /// Data volume (transfer duration in ticks) for task edges.
    pub weight: i64,
}

/// Node/edge container shared by task DAGs and system topologies.
///
/// Nodes are kept ordered by id so every iteration, and therefore every schedule derived
/// from the graph, is deterministic. Edges keep their insertion order.
#[derive(Debug, Clone)]
pub struct Graph<D: Directedness> {
    pub id: GraphId,
    nodes: BTreeMap<NodeId, Node>,
    edges: Vec<Edge>,
    _kind: PhantomData<D>,
}

pub type Dag = Graph<Directed>;
pub type Topology = Graph<Undirected>;

impl<D: Directedness> Default for Graph<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Directedness> Graph<D> {
    pub fn new() -> Self {
        Self { id: GraphId::generate(), nodes: BTreeMap::new(), edges: Vec::new(), _kind: PhantomData }
    }

    pub fn is_directed(&self) -> bool {
        D::DIRECTED
    }

    /// Adds a node. Without an explicit id a random one is generated.
    ///
    /// Fails with `Error::DuplicateNode` if the id is already taken.
    pub fn add_node(&mut self, x: f64, y: f64, weight: i64, id: Option<NodeId>) -> Result<NodeId> {
        let id = match id {
            Some(id) => id,
            None => {
                let mut generated = NodeId::generate();
                while self.nodes.contains_key(&generated) {
                    generated = NodeId::generate();
                }
                generated
            }
        };

        if self.nodes.contains_key(&id) {
            return Err(Error::DuplicateNode(id));
        }

        self.nodes.insert(id.clone(), Node { id: id.clone(), x, y, weight });
        Ok(id)
    }

    /// Adds an edge between two existing nodes.
    pub fn add_edge(&mut self, source: impl Into<NodeId>, target: impl Into<NodeId>, weight: i64) -> Result<()> {
        let source = source.into();
        let target = target.into();

        if !self.nodes.contains_key(&source) {
            return Err(Error::UnknownNode(source));
        }
        if !self.nodes.contains_key(&target) {
            return Err(Error::UnknownNode(target));
        }

        self.edges.push(Edge { source, target, weight });
        Ok(())
    }

    /// Removes a node together with every edge touching it.
    pub fn delete_node(&mut self, id: &NodeId) -> Option<Node> {
        let removed = self.nodes.remove(id)?;
        self.edges.retain(|edge| &edge.source != id && &edge.target != id);
        Some(removed)
    }

    /// Removes the first edge running from `source` to `target`.
    pub fn delete_edge(&mut self, source: &NodeId, target: &NodeId) -> Option<Edge> {
        let position = self.edges.iter().position(|edge| &edge.source == source && &edge.target == target)?;
        Some(self.edges.remove(position))
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Neighbours of `id` in edge order.
    ///
    /// Directed graphs honour `traversal`; undirected graphs report both endpoints of every
    /// incident edge, so parallel edges produce repeated neighbours.
    pub fn neighbours(&self, id: &NodeId, traversal: Traversal) -> Vec<NodeId> {
        let mut neighbours = Vec::new();
        for edge in &self.edges {
            if D::DIRECTED {
                match traversal {
                    Traversal::Forward if &edge.source == id => neighbours.push(edge.target.clone()),
                    Traversal::Backward if &edge.target == id => neighbours.push(edge.source.clone()),
                    _ => {}
                }
            } else {
                if &edge.source == id {
                    neighbours.push(edge.target.clone());
                }
                if &edge.target == id {
                    neighbours.push(edge.source.clone());
                }
            }
        }
        neighbours
    }

    /// Neighbour lists of every node, built in one pass over the edges.
    pub fn adjacency(&self, traversal: Traversal) -> BTreeMap<NodeId, Vec<NodeId>> {
        let mut adjacency: BTreeMap<NodeId, Vec<NodeId>> = self.nodes.keys().map(|id| (id.clone(), Vec::new())).collect();

        for edge in &self.edges {
            let forward = !D::DIRECTED || traversal == Traversal::Forward;
            let backward = !D::DIRECTED || traversal == Traversal::Backward;

            if forward {
                if let Some(list) = adjacency.get_mut(&edge.source) {
                    list.push(edge.target.clone());
                }
            }
            if backward {
                if let Some(list) = adjacency.get_mut(&edge.target) {
                    list.push(edge.source.clone());
                }
            }
        }
        adjacency
    }

    /// Number of edge endpoints at `id` (in plus out degree for a DAG).
    pub fn degree(&self, id: &NodeId) -> usize {
        self.edges.iter().map(|edge| usize::from(&edge.source == id) + usize::from(&edge.target == id)).sum()
    }

    pub fn serialize(&self) -> GraphDto {
        GraphDto {
            nodes: self.nodes.values().map(|node| NodeDto { n_id: node.id.to_string(), x: node.x, y: node.y, weight: node.weight }).collect(),
            edges: self
                .edges
                .iter()
                .map(|edge| EdgeDto { source: edge.source.to_string(), target: edge.target.to_string(), weight: edge.weight })
                .collect(),
        }
    }

    /// Rebuilds a graph from its persistence record, applying `override_node` to every node first.
    pub fn deserialize(dto: &GraphDto, override_node: Option<&NodeOverrideDto>) -> Result<Self> {
        let mut graph = Self::new();

        for node in &dto.nodes {
            let mut node = node.clone();
            if let Some(override_node) = override_node {
                override_node.apply(&mut node);
            }
            graph.add_node(node.x, node.y, node.weight, Some(NodeId::new(node.n_id)))?;
        }

        for edge in &dto.edges {
            graph.add_edge(edge.source.as_str(), edge.target.as_str(), edge.weight)?;
        }

        Ok(graph)
    }

    /// Renames the nodes "0", "1", ... in ascending (y, x) layout order and rewrites the edges.
    pub fn re_enumerate(&mut self) {
        let mut ordered: Vec<Node> = std::mem::take(&mut self.nodes).into_values().collect();
        ordered.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

        let mut renamed: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        for (index, mut node) in ordered.into_iter().enumerate() {
            let new_id = NodeId::new(index.to_string());
            renamed.insert(node.id.clone(), new_id.clone());
            node.id = new_id.clone();
            self.nodes.insert(new_id, node);
        }

        for edge in self.edges.iter_mut() {
            if let Some(source) = renamed.get(&edge.source) {
                edge.source = source.clone();
            }
            if let Some(target) = renamed.get(&edge.target) {
                edge.target = target.clone();
            }
        }
    }
}

impl Graph<Directed> {
    /// Edges ending in `id`, i.e. the data transfers a task waits for.
    pub fn edges_to(&self, id: &NodeId) -> Vec<&Edge> {
        self.edges.iter().filter(|edge| &edge.target == id).collect()
    }

    /// Total weight of all tasks, the makespan of running the DAG on a single unit.
    pub fn duration_on_one_cpu(&self) -> i64 {
        self.nodes.values().map(|node| node.weight).sum()
    }

    /// Share of computation in the total work: node weight / (node weight + edge weight).
    pub fn correlation(&self) -> f64 {
        let node_weight: i64 = self.duration_on_one_cpu();
        let edge_weight: i64 = self.edges.iter().map(|edge| edge.weight).sum();

        if node_weight + edge_weight == 0 {
            return 0.0;
        }
        node_weight as f64 / (node_weight + edge_weight) as f64
    }

    /// Topological layers: each level holds the nodes whose predecessors all sit in earlier levels.
    pub fn levels(&self) -> Result<Vec<Vec<NodeId>>> {
        let predecessors = self.adjacency(Traversal::Backward);
        let mut placed: BTreeSet<NodeId> = BTreeSet::new();
        let mut levels = Vec::new();

        while placed.len() < self.nodes.len() {
            let level: Vec<NodeId> = self
                .nodes
                .keys()
                .filter(|id| !placed.contains(*id))
                .filter(|id| predecessors.get(*id).is_none_or(|preds| preds.iter().all(|pred| placed.contains(pred))))
                .cloned()
                .collect();

            if level.is_empty() {
                let remaining: Vec<NodeId> = self.nodes.keys().filter(|id| !placed.contains(*id)).cloned().collect();
                return Err(Error::CyclicGraph(remaining));
            }

            placed.extend(level.iter().cloned());
            levels.push(level);
        }

        Ok(levels)
    }

    /// Lays the DAG out level by level for display.
    pub fn arrange(&mut self) -> Result<()> {
        const WIDTH: f64 = 600.0;
        const LEFT: f64 = 50.0;
        const TOP: f64 = 40.0;
        const LEVEL_HEIGHT: f64 = 130.0;

        let levels = self.levels()?;
        let mut y = TOP;
        for level in levels {
            let mut x = LEFT;
            let step = WIDTH / level.len() as f64;
            for id in level {
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.x = x;
                    node.y = y;
                }
                x += step;
            }
            y += LEVEL_HEIGHT;
        }
        Ok(())
    }
}
