//! Single-consumer FIFO execution queue.
//!
//! One unbounded channel, one consumer task. Items are handled strictly in
//! submission order; the next item is not dequeued until the handler future
//! for the current one has completed. [`ExecutionQueue::stop`] closes the
//! submission side; items already accepted are drained before the consumer
//! exits.

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use lodestone_core::Error;

const STATE_FRESH: u8 = 0;
const STATE_INITIALIZED: u8 = 1;
const STATE_DRAINING: u8 = 2;
const STATE_STOPPED: u8 = 3;

pub struct ExecutionQueue<T> {
    state: Arc<AtomicU8>,
    tx: Mutex<Option<mpsc::UnboundedSender<T>>>,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> ExecutionQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(STATE_FRESH)),
            tx: Mutex::new(None),
            consumer: Mutex::new(None),
        }
    }

    /// Spawn the consumer task. Fails on a second call.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F, Fut>(&self, mut handler: F) -> Result<(), Error>
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.state
            .compare_exchange(
                STATE_FRESH,
                STATE_INITIALIZED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| Error::AlreadyInitialized("execution queue"))?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        *self.tx.lock().unwrap() = Some(tx);

        let state = Arc::clone(&self.state);
        let consumer = tokio::spawn(async move {
            while let Some(item) = rx.recv().await {
                handler(item).await;
            }
            state.store(STATE_STOPPED, Ordering::Release);
        });
        *self.consumer.lock().unwrap() = Some(consumer);
        Ok(())
    }

    /// Hand an item to the consumer. FIFO with respect to other `submit`
    /// calls that happen-before this one.
    pub fn submit(&self, item: T) -> Result<(), Error> {
        let tx = self.tx.lock().unwrap();
        match tx.as_ref() {
            Some(tx) => tx.send(item).map_err(|_| Error::QueueClosed),
            None if self.state.load(Ordering::Acquire) == STATE_FRESH => {
                Err(Error::NotInitialized("execution queue"))
            }
            None => Err(Error::QueueClosed),
        }
    }

    /// Close the submission side. Items already accepted are still drained;
    /// further `submit` calls fail with `QueueClosed`.
    pub fn stop(&self) {
        let took = self.tx.lock().unwrap().take().is_some();
        if took {
            let _ = self.state.compare_exchange(
                STATE_INITIALIZED,
                STATE_DRAINING,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        } else {
            // Never started: nothing to drain.
            let _ = self.state.compare_exchange(
                STATE_FRESH,
                STATE_STOPPED,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }
    }

    /// Wait for the consumer to finish draining and exit.
    pub async fn join(&self) {
        let consumer = self.consumer.lock().unwrap().take();
        if let Some(consumer) = consumer {
            if let Err(err) = consumer.await {
                tracing::warn!(error = %err, "queue consumer terminated abnormally");
            }
        }
    }

    pub async fn stop_and_join(&self) {
        self.stop();
        self.join().await;
    }

    pub fn is_stopped(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_STOPPED
    }
}

impl<T: Send + 'static> Default for ExecutionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
