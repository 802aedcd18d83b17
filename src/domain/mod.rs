pub mod benchmark;
pub mod graph;
pub mod routing;
pub mod scheduler;
pub mod system;
pub mod utils;
