//! Lodestone SDK Task Pipeline
//!
//! Composition primitives for multi-step asynchronous operations against the
//! store: the [`AsyncTask`] hook set and its runner (init → dispatch →
//! complete-or-retry, with bounded backoff over the transient region-error
//! class), the [`Synchronizer`] adaptor for call-sites that need a blocking
//! result, and the [`Actuator`] timer collaborator used to schedule retries.

pub mod actuator;
pub mod policy;
pub mod sync;
pub mod task;

// Re-export commonly used types
pub use actuator::{Actuator, TokioActuator};
pub use policy::RetryPolicy;
pub use sync::Synchronizer;
pub use task::{AsyncTask, AsyncTaskRunner, Completion, StatusCallback};
