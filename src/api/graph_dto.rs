use serde::{Deserialize, Serialize};

/// Persistence record of a graph, shared with external editors.
///
/// The shape is `{ nodes: [{n_id, x, y, weight}], edges: [{source, target, weight}] }`
/// and must stay field-for-field compatible with saved graphs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct GraphDto {
    pub nodes: Vec<NodeDto>,
    pub edges: Vec<EdgeDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeDto {
    pub n_id: String,
    pub x: f64,
    pub y: f64,
    pub weight: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EdgeDto {
    pub source: String,
    pub target: String,
    pub weight: i64,
}

/// Fields forced onto every node while a record is loaded, e.g. a uniform link count for a topology.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct NodeOverrideDto {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub weight: Option<i64>,
}

impl NodeOverrideDto {
    pub fn apply(&self, node: &mut NodeDto) {
        if let Some(x) = self.x {
            node.x = x;
        }
        if let Some(y) = self.y {
            node.y = y;
        }
        if let Some(weight) = self.weight {
            node.weight = weight;
        }
    }
}
