//! Fan-out over a fixed pool of workers.
//!
//! Two routing modes. Round-robin spreads stateless tasks over every worker
//! for throughput; hash routing pins all tasks that share a key onto one
//! worker, so per-key submission order is preserved without any locking.
//! Admission control is a single aggregate cap: when the set-wide pending
//! count reaches `max_pending`, submissions are rejected before any routing
//! happens.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use prometheus::Registry;

use lodestone_core::Error;

use crate::config::WorkerSetOptions;
use crate::metrics::WorkerSetMetrics;
use crate::task::TaskRef;
use crate::worker::{NotifyHandler, Worker, WorkerEvent};

pub struct WorkerSet {
    name: String,
    max_pending: i64,
    workers: Vec<Arc<Worker>>,
    cursor: AtomicU64,
    total: AtomicU64,
    // Signed: a worker's finish notification can overtake the matching add
    // accounting under extreme interleavings; the quiescent value is exact.
    pending: AtomicI64,
    metrics: WorkerSetMetrics,
}

impl WorkerSet {
    /// Build the set and its workers. Workers are wired back to the set
    /// through a weak reference so their notifier events drive the aggregate
    /// accounting in [`WorkerSet::watch_worker`].
    pub fn new(options: WorkerSetOptions) -> Result<Arc<Self>, Error> {
        if options.worker_num == 0 {
            return Err(Error::InvalidOptions("worker_num must be > 0".to_string()));
        }
        if options.max_pending < 0 {
            return Err(Error::InvalidOptions(
                "max_pending must be >= 0 (0 = unbounded)".to_string(),
            ));
        }
        let metrics =
            WorkerSetMetrics::new(&options.name).map_err(|err| Error::Metrics(err.to_string()))?;

        Ok(Arc::new_cyclic(|weak: &Weak<WorkerSet>| {
            let workers = (0..options.worker_num)
                .map(|_| {
                    let weak = Weak::clone(weak);
                    let notify: NotifyHandler = Arc::new(move |event| {
                        if let Some(set) = weak.upgrade() {
                            set.watch_worker(event);
                        }
                    });
                    Arc::new(Worker::new(Some(notify), options.use_trace))
                })
                .collect();
            WorkerSet {
                name: options.name,
                max_pending: options.max_pending,
                workers,
                cursor: AtomicU64::new(0),
                total: AtomicU64::new(0),
                pending: AtomicI64::new(0),
                metrics,
            }
        }))
    }

    /// Bring up every worker. On partial failure the workers already started
    /// are torn down again and the whole init fails.
    pub async fn init(&self) -> Result<(), Error> {
        for (idx, worker) in self.workers.iter().enumerate() {
            if let Err(err) = worker.init() {
                tracing::warn!(
                    name = %self.name,
                    worker = idx,
                    error = %err,
                    "worker failed to start, tearing the set down"
                );
                for started in self.workers[..idx].iter().rev() {
                    started.destroy().await;
                }
                return Err(Error::PartialInit {
                    name: self.name.clone(),
                    started: idx as u32,
                    requested: self.workers.len() as u32,
                });
            }
        }
        tracing::info!(
            name = %self.name,
            workers = self.workers.len(),
            max_pending = self.max_pending,
            "worker set started"
        );
        Ok(())
    }

    /// Tear down every worker in reverse order, draining accepted tasks.
    pub async fn destroy(&self) {
        for worker in self.workers.iter().rev() {
            worker.destroy().await;
        }
        tracing::info!(name = %self.name, "worker set stopped");
    }

    fn admit(&self) -> bool {
        self.max_pending == 0 || self.pending.load(Ordering::Relaxed) < self.max_pending
    }

    /// Round-robin submission. Tries up to `worker_num` workers starting at
    /// the rotating cursor; the cursor advances on every attempt, accepted
    /// or not.
    pub fn execute_rr(&self, task: TaskRef) -> bool {
        if !self.admit() {
            tracing::debug!(
                name = %self.name,
                pending = self.pending.load(Ordering::Relaxed),
                max_pending = self.max_pending,
                "pending task cap reached, rejecting task"
            );
            return false;
        }
        let worker_num = self.workers.len() as u64;
        for _ in 0..self.workers.len() {
            let idx = (self.cursor.fetch_add(1, Ordering::Relaxed) % worker_num) as usize;
            if self.workers[idx].execute(Arc::clone(&task)) {
                return true;
            }
        }
        tracing::debug!(name = %self.name, "no worker accepted the task");
        false
    }

    /// Affinity submission: every task with the same key lands on the same
    /// worker, preserving per-key order. There is no failover: if the chosen
    /// worker rejects, the submission fails.
    pub fn execute_hash_by(&self, key: u64, task: TaskRef) -> bool {
        if !self.admit() {
            tracing::debug!(
                name = %self.name,
                key,
                pending = self.pending.load(Ordering::Relaxed),
                max_pending = self.max_pending,
                "pending task cap reached, rejecting task"
            );
            return false;
        }
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let idx = (hasher.finish() % self.workers.len() as u64) as usize;
        self.workers[idx].execute(task)
    }

    /// Aggregate accounting, driven by each worker's notifier.
    pub fn watch_worker(&self, event: WorkerEvent) {
        match event {
            WorkerEvent::AddTask => {
                self.total.fetch_add(1, Ordering::Relaxed);
                self.pending.fetch_add(1, Ordering::Relaxed);
                self.metrics.total_task_count.inc();
                self.metrics.pending_task_count.inc();
            }
            WorkerEvent::FinishTask => {
                self.pending.fetch_sub(1, Ordering::Relaxed);
                self.metrics.pending_task_count.dec();
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Tasks ever accepted across all workers. Monotonic.
    pub fn total_count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Tasks accepted but not yet finished, summed over all workers.
    pub fn pending_count(&self) -> i64 {
        self.pending.load(Ordering::Relaxed)
    }

    /// Per-worker accepted counts, indexed by worker.
    pub fn worker_totals(&self) -> Vec<u64> {
        self.workers.iter().map(|w| w.total_count()).collect()
    }

    /// Per-worker trace snapshots of every pending task.
    pub fn pending_traces(&self) -> Vec<Vec<String>> {
        self.workers.iter().map(|w| w.pending_traces()).collect()
    }

    /// Attach `<name>_total_task_count` and `<name>_pending_task_count` to a
    /// host registry.
    pub fn register_metrics(&self, registry: &Registry) -> Result<(), Error> {
        self.metrics
            .register(registry)
            .map_err(|err| Error::Metrics(err.to_string()))
    }
}
