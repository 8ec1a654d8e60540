//! A worker: one single-consumer queue plus its bookkeeping.
//!
//! The submit path is accept-or-reject: bookkeeping (pending count, trace
//! snapshot) is recorded before the enqueue and backed out in full if the
//! queue refuses, so a rejected submission moves no counters. The consumer
//! reverses the bookkeeping after each `run` returns, which keeps
//! `pending_count` equal to the trace-map size at every instant.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use lodestone_core::Error;

use crate::queue::ExecutionQueue;
use crate::task::TaskRef;

/// Event delivered to a worker's notifier.
///
/// `AddTask` fires after a submission is definitely accepted, `FinishTask`
/// after the task's `run` has returned. Events from one worker arrive in the
/// order they occur; events from different workers are unordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEvent {
    AddTask,
    FinishTask,
}

pub type NotifyHandler = Arc<dyn Fn(WorkerEvent) + Send + Sync>;

pub struct Worker {
    available: AtomicBool,
    queue: ExecutionQueue<TaskRef>,
    meter: Arc<Meter>,
}

/// Bookkeeping shared between the submit path and the consumer task.
struct Meter {
    total: AtomicU64,
    pending: AtomicI64,
    use_trace: bool,
    traces: Mutex<BTreeMap<u64, String>>,
    notify: Option<NotifyHandler>,
}

impl Meter {
    fn accept(&self, id: u64, trace: String) {
        self.pending.fetch_add(1, Ordering::Relaxed);
        if self.use_trace {
            self.traces.lock().unwrap().insert(id, trace);
        }
    }

    fn back_out(&self, id: u64) {
        if self.use_trace {
            self.traces.lock().unwrap().remove(&id);
        }
        self.pending.fetch_sub(1, Ordering::Relaxed);
    }

    fn finish(&self, id: u64) {
        if self.use_trace {
            self.traces.lock().unwrap().remove(&id);
        }
        self.pending.fetch_sub(1, Ordering::Relaxed);
        self.emit(WorkerEvent::FinishTask);
    }

    // Always called outside the trace mutex.
    fn emit(&self, event: WorkerEvent) {
        if let Some(notify) = &self.notify {
            notify(event);
        }
    }
}

impl Worker {
    pub fn new(notify: Option<NotifyHandler>, use_trace: bool) -> Self {
        Self {
            available: AtomicBool::new(false),
            queue: ExecutionQueue::new(),
            meter: Arc::new(Meter {
                total: AtomicU64::new(0),
                pending: AtomicI64::new(0),
                use_trace,
                traces: Mutex::new(BTreeMap::new()),
                notify,
            }),
        }
    }

    /// Allocate the queue consumer and open for submissions. Fails on a
    /// second call.
    pub fn init(&self) -> Result<(), Error> {
        let meter = Arc::clone(&self.meter);
        self.queue.start(move |task: TaskRef| {
            let meter = Arc::clone(&meter);
            consume(meter, task)
        })?;
        self.available.store(true, Ordering::Release);
        Ok(())
    }

    /// Stop accepting work, drain tasks already accepted, and release the
    /// consumer. Safe on an uninitialized worker; idempotent.
    pub async fn destroy(&self) {
        self.available.store(false, Ordering::Release);
        self.queue.stop_and_join().await;
    }

    /// Atomic accept-or-reject. Returns true iff the task will eventually
    /// run.
    pub fn execute(&self, task: TaskRef) -> bool {
        if !self.available.load(Ordering::Acquire) {
            return false;
        }
        let id = task.id();
        let trace = if self.meter.use_trace {
            task.trace()
        } else {
            String::new()
        };
        self.meter.accept(id, trace);
        if let Err(err) = self.queue.submit(task) {
            self.meter.back_out(id);
            tracing::debug!(task_id = id, error = %err, "task rejected by execution queue");
            return false;
        }
        self.meter.total.fetch_add(1, Ordering::Relaxed);
        self.meter.emit(WorkerEvent::AddTask);
        true
    }

    /// Tasks ever accepted. Monotonic.
    pub fn total_count(&self) -> u64 {
        self.meter.total.load(Ordering::Relaxed)
    }

    /// Tasks accepted but not yet finished.
    pub fn pending_count(&self) -> i64 {
        self.meter.pending.load(Ordering::Relaxed)
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    /// Fire the configured notifier directly.
    pub fn notify(&self, event: WorkerEvent) {
        self.meter.emit(event);
    }

    /// Trace snapshots of every enqueued or running task, in submission
    /// order. Empty when trace recording is off.
    pub fn pending_traces(&self) -> Vec<String> {
        self.meter.traces.lock().unwrap().values().cloned().collect()
    }
}

async fn consume(meter: Arc<Meter>, task: TaskRef) {
    let id = task.id();
    let run = tokio::spawn({
        let task = Arc::clone(&task);
        async move { task.run().await }
    });
    // A panicking task surfaces here as a JoinError; the consumer carries on.
    if let Err(err) = run.await {
        if err.is_panic() {
            tracing::warn!(
                task_id = id,
                task_type = task.task_type(),
                "task panicked during run"
            );
        } else {
            tracing::warn!(
                task_id = id,
                task_type = task.task_type(),
                error = %err,
                "task aborted during run"
            );
        }
    }
    meter.finish(id);
}
