//! Retry budget and backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How often and how fast the runner re-dispatches on a transient region
/// error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total dispatch budget, including the first attempt. Must be >= 1.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(100),
        }
    }
}
