pub mod context;
pub mod queue_policy;
pub mod ready_tracker;
pub mod scheduler;
pub mod scheduler_type;
pub mod settings;
pub mod transfer_scheduler;
pub mod unit_priority;
pub mod unit_selector;

#[cfg(test)]
mod scheduler_tests;
