//! Retrying async task pipeline.
//!
//! An [`AsyncTask`] supplies the hooks of a multi-step operation: a
//! synchronous `init`, an asynchronous launch (`do_async`), and optional
//! post-processing. The [`AsyncTaskRunner`] drives them: init → dispatch →
//! complete-or-retry. A transient region error reschedules the dispatch
//! through the [`Actuator`] after the policy backoff; any other failure, or
//! an exhausted attempt budget, finalizes immediately. The caller's callback
//! fires exactly once on every exit path, and the runner stays alive until it
//! has: the [`Completion`] handle and the scheduled retry closure each hold
//! a strong reference to it.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use lodestone_core::Status;

use crate::actuator::Actuator;
use crate::policy::RetryPolicy;
use crate::sync::Synchronizer;

pub type StatusCallback = Box<dyn FnOnce(Status) + Send>;

/// One-shot handle through which a [`AsyncTask::do_async`] implementation
/// reports the status of its launched step.
pub struct Completion {
    deliver: Box<dyn FnOnce(Status) + Send>,
}

impl Completion {
    fn new(deliver: impl FnOnce(Status) + Send + 'static) -> Self {
        Self {
            deliver: Box::new(deliver),
        }
    }

    pub fn complete(self, status: Status) {
        (self.deliver)(status)
    }
}

/// Hook set of a multi-step asynchronous operation.
pub trait AsyncTask: Send + Sync + 'static {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Synchronous setup before the first dispatch. A non-OK status skips
    /// the dispatch entirely and finalizes with that status.
    fn init(&self) -> Status {
        Status::ok()
    }

    /// Launch the asynchronous step. The completion must eventually be
    /// consumed with the step's status, exactly once per call.
    fn do_async(&self, completion: Completion);

    /// Hook run after the terminal status is decided, before the callback.
    fn post_process(&self) {}

    /// Extra diagnostic appended to the failure log line.
    fn error_message(&self) -> String {
        String::new()
    }
}

/// Drives an [`AsyncTask`] to a single terminal status.
pub struct AsyncTaskRunner<T: AsyncTask> {
    task: T,
    policy: RetryPolicy,
    actuator: Arc<dyn Actuator>,
    started: AtomicBool,
    retries: AtomicU32,
    callback: Mutex<Option<StatusCallback>>,
}

impl<T: AsyncTask> AsyncTaskRunner<T> {
    pub fn new(task: T, policy: RetryPolicy, actuator: Arc<dyn Actuator>) -> Arc<Self> {
        Arc::new(Self {
            task,
            policy,
            actuator,
            started: AtomicBool::new(false),
            retries: AtomicU32::new(0),
            callback: Mutex::new(None),
        })
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    /// Start driving the task. `callback` fires exactly once with the
    /// terminal status; the runner must not be re-run afterwards.
    pub fn async_run(self: Arc<Self>, callback: StatusCallback) {
        if self.started.swap(true, Ordering::AcqRel) {
            tracing::warn!(task = self.task.name(), "task was already run");
            callback(Status::invalid_argument("task was already run"));
            return;
        }
        *self.callback.lock().unwrap() = Some(callback);
        let status = self.task.init();
        if status.is_ok() {
            self.dispatch();
        } else {
            self.finish(status);
        }
    }

    /// Blocking façade over [`AsyncTaskRunner::async_run`]. Must be called
    /// from outside the async runtime.
    pub fn run(self: Arc<Self>) -> Status {
        let (sync, callback) = Synchronizer::new();
        self.async_run(callback);
        sync.wait()
    }

    fn dispatch(self: Arc<Self>) {
        let runner = Arc::clone(&self);
        let completion = Completion::new(move |status| runner.do_async_done(status));
        self.task.do_async(completion);
    }

    fn do_async_done(self: Arc<Self>, status: Status) {
        if status.is_ok() {
            self.finish(status);
        } else {
            self.fail_or_retry(status);
        }
    }

    fn fail_or_retry(self: Arc<Self>, status: Status) {
        if !status.is_retryable() {
            self.finish(status);
            return;
        }
        let attempt = self.retries.fetch_add(1, Ordering::Relaxed) + 1;
        if attempt < self.policy.max_attempts {
            tracing::debug!(
                task = self.task.name(),
                attempt,
                backoff_ms = self.policy.backoff.as_millis() as u64,
                status = %status,
                "transient region error, scheduling retry"
            );
            let runner = Arc::clone(&self);
            self.actuator
                .schedule(Box::new(move || runner.dispatch()), self.policy.backoff);
        } else {
            let message = format!(
                "task {} gave up after {} attempts, last error: {}",
                self.task.name(),
                attempt,
                status
            );
            self.finish(Status::aborted(message).with_code(status.code()));
        }
    }

    fn finish(&self, status: Status) {
        self.task.post_process();
        if !status.is_ok() {
            tracing::warn!(
                task = self.task.name(),
                status = %status,
                error_msg = %self.task.error_message(),
                "task failed"
            );
        }
        let callback = self.callback.lock().unwrap().take();
        if let Some(callback) = callback {
            callback(status);
        }
    }
}
