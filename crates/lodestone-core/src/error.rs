//! Lifecycle error types
//!
//! Errors returned by executor lifecycle operations (`init`, `start`). The
//! submission hot paths deliberately return `bool` instead of `Result` to
//! stay allocation-free; only lifecycle transitions carry typed errors.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} already initialized")]
    AlreadyInitialized(&'static str),

    #[error("{0} not initialized")]
    NotInitialized(&'static str),

    #[error("execution queue closed")]
    QueueClosed,

    #[error("worker set {name}: started {started} of {requested} workers")]
    PartialInit {
        name: String,
        started: u32,
        requested: u32,
    },

    #[error("invalid worker set options: {0}")]
    InvalidOptions(String),

    #[error("metric registration failed: {0}")]
    Metrics(String),
}
