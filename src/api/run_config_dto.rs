use serde::{Deserialize, Serialize};

/// Run configuration of a single scheduling experiment.
///
/// Every field has a default so a partial JSON file (or `{}`) is a valid configuration;
/// command line flags are layered on top of the loaded values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfigDto {
    /// Path of the task DAG graph record.
    pub dag: Option<String>,

    /// Path of the system topology graph record.
    pub topology: Option<String>,

    /// Links may carry one transfer per direction at the same time.
    pub duplex: bool,

    /// Units own a dedicated IO processor, so transfers do not block computation.
    pub has_io_cpu: bool,

    /// Name of the task queue policy, see `QueuePolicyType`.
    pub queue_policy: String,

    /// Name of the unit prioritization policy, see `UnitPriorityType`.
    pub unit_priority: String,

    /// Scheduler preset, see `SchedulerType`. `unit_selector` and `transfer_scheduler` override its parts.
    pub scheduler: String,

    pub unit_selector: Option<String>,
    pub transfer_scheduler: Option<String>,

    /// Name of the router, see `RouterType`.
    pub router: String,

    /// Aggregation of per source transfer costs used by the nearest-transfer unit selector (`sum` or `max`).
    pub cost_aggregation: String,

    /// Abort scheduling once the simulated clock passes this tick.
    pub max_ticks: Option<i64>,

    /// Optional CSV file receiving the resulting timelines.
    pub csv_output: Option<String>,
}

impl Default for RunConfigDto {
    fn default() -> Self {
        Self {
            dag: None,
            topology: None,
            duplex: false,
            has_io_cpu: true,
            queue_policy: "critical-path-weight".to_string(),
            unit_priority: "cohesion".to_string(),
            scheduler: "dummy".to_string(),
            unit_selector: None,
            transfer_scheduler: None,
            router: "dfs".to_string(),
            cost_aggregation: "sum".to_string(),
            max_ticks: None,
            csv_output: None,
        }
    }
}
