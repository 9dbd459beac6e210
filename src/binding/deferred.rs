//! Deferred writes: `set` with a value that is not ready yet.
//!
//! The future is spawned on the ambient tokio runtime and its output is
//! queued on a channel. Nothing touches the store until the owning
//! [`Binding`](super::Binding) drains the queue on its next tick, so
//! overlapping writes to one path land in resolution order.

use std::future::Future;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::trace;

use super::error::BindingError;
use super::SetMode;

/// A resolved deferred write.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resolved {
    pub path: String,
    pub value: serde_json::Value,
    pub mode: SetMode,
}

/// Outstanding deferred writes of one binding context.
#[derive(Debug)]
pub(crate) struct Deferred {
    sender: UnboundedSender<Resolved>,
    receiver: UnboundedReceiver<Resolved>,
    tasks: Vec<JoinHandle<()>>,
}

impl Deferred {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            tasks: Vec::new(),
        }
    }

    /// Spawn `future`; its output is queued for `path` once it resolves.
    pub fn spawn<F>(&mut self, path: String, mode: SetMode, future: F) -> Result<(), BindingError>
    where
        F: Future + Send + 'static,
        F::Output: Into<serde_json::Value> + Send,
    {
        let handle = Handle::try_current().map_err(|_| BindingError::NoRuntime)?;
        let sender = self.sender.clone();
        self.tasks.retain(|task| !task.is_finished());
        self.tasks.push(handle.spawn(async move {
            let value = future.await.into();
            trace!(path = %path, "deferred value resolved");
            // The receiver only goes away with the binding itself.
            let _ = sender.send(Resolved { path, value, mode });
        }));
        Ok(())
    }

    /// Resolved writes in resolution order.
    pub fn drain(&mut self) -> Vec<Resolved> {
        let mut resolved = Vec::new();
        while let Ok(write) = self.receiver.try_recv() {
            resolved.push(write);
        }
        resolved
    }

    /// Wait for every outstanding future to resolve.
    pub async fn wait(&mut self) {
        for task in std::mem::take(&mut self.tasks) {
            // A panicked or aborted task simply produces no write.
            let _ = task.await;
        }
    }

    /// Number of futures that have not resolved yet.
    pub fn pending(&self) -> usize {
        self.tasks.iter().filter(|task| !task.is_finished()).count()
    }

    /// Cancel outstanding futures and drop queued writes.
    pub fn abort(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        while self.receiver.try_recv().is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn spawn_without_runtime_fails() {
        let mut deferred = Deferred::new();
        let result = deferred.spawn("a".into(), SetMode::Default, async { "x" });
        assert!(matches!(result, Err(BindingError::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn writes_drain_in_resolution_order() {
        let mut deferred = Deferred::new();
        deferred
            .spawn("a".into(), SetMode::Default, async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                "slow"
            })
            .unwrap();
        deferred
            .spawn("a".into(), SetMode::Default, async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                "fast"
            })
            .unwrap();
        assert!(deferred.drain().is_empty());

        deferred.wait().await;
        let values: Vec<_> = deferred.drain().into_iter().map(|w| w.value).collect();
        assert_eq!(values, vec![serde_json::json!("fast"), serde_json::json!("slow")]);
        assert_eq!(deferred.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_drops_pending_writes() {
        let mut deferred = Deferred::new();
        deferred
            .spawn("a".into(), SetMode::Default, async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                1
            })
            .unwrap();
        deferred.abort();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(deferred.drain().is_empty());
    }
}
