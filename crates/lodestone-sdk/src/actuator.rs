//! Delayed-execution collaborator.

use std::time::Duration;

/// External timer service used to schedule retry dispatches.
///
/// `schedule` must run `f` at least once after `delay` has elapsed, on some
/// execution context. There is no cancellation surface.
pub trait Actuator: Send + Sync + 'static {
    fn schedule(&self, f: Box<dyn FnOnce() + Send>, delay: Duration);
}

/// Tokio-backed actuator: one spawned sleep per scheduled closure.
///
/// Requires a running Tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioActuator;

impl Actuator for TokioActuator {
    fn schedule(&self, f: Box<dyn FnOnce() + Send>, delay: Duration) {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        });
    }
}
