//! Per-set Prometheus metrics.

use prometheus::{IntCounter, IntGauge, Registry};

/// Counter pair maintained by each worker set and attachable to a
/// host-supplied registry: `<name>_total_task_count` (monotonic accepted
/// count) and `<name>_pending_task_count` (accepted minus finished).
pub struct WorkerSetMetrics {
    pub(crate) total_task_count: IntCounter,
    pub(crate) pending_task_count: IntGauge,
}

impl WorkerSetMetrics {
    pub fn new(name: &str) -> prometheus::Result<Self> {
        Ok(Self {
            total_task_count: IntCounter::new(
                format!("{name}_total_task_count"),
                format!("Tasks ever accepted by the {name} worker set"),
            )?,
            pending_task_count: IntGauge::new(
                format!("{name}_pending_task_count"),
                format!("Tasks accepted but not yet finished by the {name} worker set"),
            )?,
        })
    }

    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.total_task_count.clone()))?;
        registry.register(Box::new(self.pending_task_count.clone()))?;
        Ok(())
    }
}
