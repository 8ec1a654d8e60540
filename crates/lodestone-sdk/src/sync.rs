//! Blocking adaptor for one-shot status callbacks.

use tokio::sync::oneshot;

use lodestone_core::Status;

use crate::task::StatusCallback;

/// Converts a one-shot status callback into a waitable result.
///
/// `new` hands back the wait half and the callback half together; both are
/// single-use by construction (the callback is `FnOnce`, `wait` consumes the
/// synchronizer), so waiting twice is unrepresentable.
pub struct Synchronizer {
    rx: oneshot::Receiver<Status>,
}

impl Synchronizer {
    pub fn new() -> (Self, StatusCallback) {
        let (tx, rx) = oneshot::channel();
        let callback: StatusCallback = Box::new(move |status| {
            // Receiver gone means nobody is waiting anymore; drop the status.
            let _ = tx.send(status);
        });
        (Self { rx }, callback)
    }

    /// Block the calling thread until the callback fires.
    ///
    /// Must be called from outside the async runtime; use
    /// [`Synchronizer::wait_async`] inside it.
    pub fn wait(self) -> Status {
        self.rx
            .blocking_recv()
            .unwrap_or_else(|_| Status::aborted("status callback dropped without firing"))
    }

    /// Await the callback without blocking the runtime.
    pub async fn wait_async(self) -> Status {
        self.rx
            .await
            .unwrap_or_else(|_| Status::aborted("status callback dropped without firing"))
    }
}

#[cfg(test)]
mod tests {
    use lodestone_core::{ErrorCode, Status};

    use super::*;

    #[test]
    fn wait_returns_the_delivered_status() {
        let (sync, callback) = Synchronizer::new();
        callback(Status::incomplete(ErrorCode::KeyOutOfRange, "split"));
        assert_eq!(
            sync.wait(),
            Status::incomplete(ErrorCode::KeyOutOfRange, "split")
        );
    }

    #[tokio::test]
    async fn wait_async_returns_the_delivered_status() {
        let (sync, callback) = Synchronizer::new();
        tokio::spawn(async move {
            callback(Status::ok());
        });
        assert!(sync.wait_async().await.is_ok());
    }

    #[test]
    fn dropped_callback_surfaces_as_aborted() {
        let (sync, callback) = Synchronizer::new();
        drop(callback);
        assert_eq!(sync.wait().kind(), lodestone_core::StatusKind::Aborted);
    }
}
