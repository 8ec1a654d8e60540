//! The unit-of-work contract.

use std::sync::Arc;

use async_trait::async_trait;

/// An opaque unit of work.
///
/// Implementations allocate their id from [`lodestone_core::next_task_id`]
/// at construction and report it unchanged for the task's lifetime. `run`
/// executes exactly once per submission; a task must not be re-submitted
/// after it has run.
///
/// Failures are the task's own business: `run` reports them through whatever
/// completion channel the call-site uses (a oneshot, a callback, internal
/// state), never through the executor. A panic inside `run` is caught and
/// logged by the consumer and does not tear the worker down.
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Stable task id, unique within the process.
    fn id(&self) -> u64;

    /// Short category tag used in logs and metrics.
    fn task_type(&self) -> &str;

    /// Execute the work. Serialized with all other tasks on the same worker;
    /// free to block or suspend.
    async fn run(&self);

    /// Cheap snapshot of current progress, callable concurrently with `run`.
    fn trace(&self) -> String {
        String::new()
    }
}

pub type TaskRef = Arc<dyn Task>;
