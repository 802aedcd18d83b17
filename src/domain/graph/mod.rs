pub mod analytics;
pub mod generator;
pub mod graph;

#[cfg(test)]
mod analytics_tests;
