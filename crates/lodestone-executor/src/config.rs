//! Executor configuration.

use serde::{Deserialize, Serialize};

/// Options for building a [`WorkerSet`](crate::WorkerSet).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSetOptions {
    /// Name used in log fields and as the metric name prefix. Must be a
    /// valid metric name fragment (`[a-zA-Z_][a-zA-Z0-9_]*`).
    pub name: String,
    /// Number of workers; each owns one single-consumer queue.
    pub worker_num: u32,
    /// Aggregate pending-task cap across all workers; 0 disables admission
    /// control.
    pub max_pending: i64,
    /// Record a per-task trace snapshot while each task is pending.
    pub use_trace: bool,
}

impl Default for WorkerSetOptions {
    fn default() -> Self {
        Self {
            name: "worker_set".to_string(),
            worker_num: 4,
            max_pending: 0,
            use_trace: true,
        }
    }
}
