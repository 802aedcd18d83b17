use std::str::FromStr;

use crate::domain::graph::graph::Topology;
use crate::domain::routing::router::{DfsRouter, Router, ShortestPathRouter};
use crate::error::Error;

/// Available routing strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterType {
    /// First path found by a depth first search.
    Dfs,
    /// Fewest hops, found by a breadth first search.
    ShortestPath,
}

impl RouterType {
    /// Factory method returning the router for the variant, built over `topology`.
    pub fn get_instance(self, topology: &Topology) -> Box<dyn Router> {
        match self {
            RouterType::Dfs => Box::new(DfsRouter::new(topology)),
            RouterType::ShortestPath => Box::new(ShortestPathRouter::new(topology)),
        }
    }
}

impl FromStr for RouterType {
    type Err = Error;

    fn from_str(name: &str) -> Result<RouterType, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "dfs" | "any-path" => Ok(RouterType::Dfs),
            "shortest" | "shortest-path" | "bfs" => Ok(RouterType::ShortestPath),
            _ => Err(Error::UnknownPolicy(format!("router '{}'", name))),
        }
    }
}
