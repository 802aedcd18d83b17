use thiserror::Error;

use crate::domain::utils::id::NodeId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse graph JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to write CSV timeline: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Node {0} already exists in the graph")]
    DuplicateNode(NodeId),

    #[error("Node {0} does not exist in the graph")]
    UnknownNode(NodeId),

    #[error("Unit {0} does not exist in the system")]
    UnknownUnit(NodeId),

    #[error("Unit {unit} is busy in [{start}, {end}), can not place task {task}")]
    UnitBusy { unit: NodeId, task: NodeId, start: i64, end: i64 },

    #[error("Unit {unit} has no free link in [{start}, {end}) for a transfer with peer {peer}")]
    NoFreeLink { unit: NodeId, peer: NodeId, start: i64, end: i64 },

    #[error("No route from unit {from} to unit {to}: topology is disconnected")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("Task {task} must run on exactly one unit, found {units:?}")]
    PlacementInvariant { task: NodeId, units: Vec<NodeId> },

    #[error("Graph contains a cycle: {0:?}")]
    CyclicGraph(Vec<NodeId>),

    #[error("System topology is not connected")]
    DisconnectedTopology,

    #[error("No feasible time found on unit {unit} after tick {from}")]
    NoFeasibleTime { unit: NodeId, from: i64 },

    #[error("Scheduling did not finish within {0} ticks")]
    TickLimitExceeded(i64),

    #[error("No unit can ever take tasks {tasks:?}, stuck since tick {tick}")]
    Unschedulable { tick: i64, tasks: Vec<NodeId> },

    #[error("System topology has no units")]
    EmptyTopology,

    #[error("Unknown policy name: {0}")]
    UnknownPolicy(String),

    #[error("No {0} file given")]
    MissingInput(&'static str),

    #[error("Invalid generator parameters: {0}")]
    InvalidGeneratorParameters(String),
}

pub type Result<T> = std::result::Result<T, Error>;
