//! Process-wide task id allocation.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate the next task id.
///
/// Ids are unique and monotonically increasing for the lifetime of the
/// process. Wrap-around after 2^64 allocations is a non-concern.
pub fn next_task_id() -> u64 {
    NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed)
}
