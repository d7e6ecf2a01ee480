//! Cooperative cancellation shared between a caller and a running pipeline
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::AbortHandle;

/// Cloneable cancel flag. Once cancelled it stays cancelled.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so `wait_for` cannot observe a closed channel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Cancel automatically after `timeout` (request deadlines).
    ///
    /// The timer lives only as long as the returned [`Deadline`]; drop it
    /// once the run is over so no sleeping task outlives the request.
    pub fn cancel_after(&self, timeout: Duration) -> Deadline {
        let signal = self.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            signal.cancel();
        });
        Deadline {
            timer: timer.abort_handle(),
        }
    }
}

/// Pending timer armed by [`CancelSignal::cancel_after`]; aborted on drop.
#[must_use = "dropping the deadline disarms it immediately"]
#[derive(Debug)]
pub struct Deadline {
    timer: AbortHandle,
}

impl Deadline {
    pub fn is_armed(&self) -> bool {
        !self.timer.is_finished()
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}
