use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::api::graph_dto::{GraphDto, NodeOverrideDto};
use crate::domain::graph::graph::{Directedness, Graph};
use crate::error::{Error, Result};

/// Parses a JSON file into a given type `T`.
///
/// Errors are automatically converted into `crate::error::Error` variants:
/// - `Error::IoError` if the file cannot be read.
/// - `Error::DeserializationError` if the JSON is malformed.
pub fn parse_json_file<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T> {
    let data = fs::read_to_string(file_path).map_err(Error::IoError)?;

    let parsed_data: T = serde_json::from_str(&data).map_err(Error::DeserializationError)?;

    Ok(parsed_data)
}

/// Writes `value` as pretty printed JSON to `file_path`, replacing any existing file.
pub fn write_json_file<T: Serialize>(file_path: impl AsRef<Path>, value: &T) -> Result<()> {
    let data = serde_json::to_string_pretty(value)?;
    fs::write(file_path, data)?;
    Ok(())
}

/// Loads a saved graph record and rebuilds it as a DAG or a topology, depending on `D`.
pub fn load_graph<D: Directedness>(file_path: impl AsRef<Path>, override_node: Option<&NodeOverrideDto>) -> Result<Graph<D>> {
    let path = file_path.as_ref();
    let dto: GraphDto = parse_json_file(path)?;
    let graph = Graph::<D>::deserialize(&dto, override_node)?;

    log::debug!("Loaded graph '{}' with {} nodes and {} edges.", path.display(), graph.node_count(), graph.edge_count());
    Ok(graph)
}

pub fn save_graph<D: Directedness>(file_path: impl AsRef<Path>, graph: &Graph<D>) -> Result<()> {
    write_json_file(file_path, &graph.serialize())
}
