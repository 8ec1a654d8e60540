//! Lodestone Core Library
//!
//! Types shared by the executor and SDK crates: completion [`Status`] values
//! carrying the region-error taxonomy, lifecycle errors, and the process-wide
//! task id generator.

pub mod error;
pub mod ids;
pub mod status;

// Re-export commonly used types
pub use error::Error;
pub use ids::next_task_id;
pub use status::{ErrorCode, Status, StatusKind};
