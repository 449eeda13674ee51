//! Link readers
//!
//! A reader loop owns exactly one transport connection, decodes what arrives
//! on it and writes readings into the shared [`ReadingStore`]. Two transports
//! exist:
//!
//! - [`socket`] - TCP text stand-in used before the glove hardware exists
//! - [`rfcomm`] - Bluetooth RFCOMM poll loop, one per physical glove
//!
//! Every loop runs as its own tokio task and is stopped cooperatively through
//! a oneshot signal that is raced against each receive, so a blocked read
//! never delays shutdown.
//!
//! [`ReadingStore`]: crate::hardware::ReadingStore

pub mod rfcomm;
pub mod socket;

use std::future::Future;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{GloveError, GloveResult};

/// Stop signal handed to a reader loop.
pub type ShutdownRx = oneshot::Receiver<()>;

/// A spawned reader loop and the means to stop it.
pub struct ReaderHandle {
    label: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<GloveResult<()>>,
}

impl ReaderHandle {
    /// Spawn `reader` on the current tokio runtime.
    ///
    /// The loop's final result is logged here, so a `ConnectionLost` surfaces
    /// as soon as it happens rather than at shutdown.
    pub fn spawn<F, Fut>(label: impl Into<String>, reader: F) -> Self
    where
        F: FnOnce(ShutdownRx) -> Fut,
        Fut: Future<Output = GloveResult<()>> + Send + 'static,
    {
        let label = label.into();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let future = reader(shutdown_rx);

        let task_label = label.clone();
        let task = tokio::spawn(async move {
            let result = future.await;
            match &result {
                Ok(()) => info!(reader = %task_label, "reader loop exited"),
                Err(err) => error!(reader = %task_label, error = %err, "reader loop terminated"),
            }
            result
        });

        Self {
            label,
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }

    /// Name used in logs, e.g. `left glove 00:06:66:8C:D3:67:1`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// True once the loop has returned, for any reason.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Ask the loop to stop. Safe to call more than once.
    pub fn signal_stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            // Err means the loop already exited.
            let _ = tx.send(());
        }
    }

    /// Wait for the loop to exit and return its result.
    pub async fn join(self) -> GloveResult<()> {
        match self.task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => Err(GloveError::ReaderPanicked(self.label)),
            Err(_) => Ok(()),
        }
    }

    /// Signal the loop and wait for it.
    pub async fn stop(mut self) -> GloveResult<()> {
        self.signal_stop();
        self.join().await
    }
}

impl std::fmt::Debug for ReaderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderHandle")
            .field("label", &self.label)
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[tokio::test]
    async fn stop_signal_reaches_loop() {
        let handle = ReaderHandle::spawn("idle", |shutdown_rx| async move {
            let _ = shutdown_rx.await;
            Ok(())
        });
        assert!(!handle.is_finished());
        assert!(handle.stop().await.is_ok());
    }

    #[tokio::test]
    async fn loop_error_is_returned_from_join() {
        let handle = ReaderHandle::spawn("failing", |_shutdown_rx| async move {
            Err(GloveError::ConnectionLost {
                link: "failing".into(),
                source: io::Error::from(io::ErrorKind::BrokenPipe),
            })
        });
        assert!(matches!(
            handle.stop().await,
            Err(GloveError::ConnectionLost { .. })
        ));
    }

    #[tokio::test]
    async fn panicking_loop_is_reported() {
        let handle = ReaderHandle::spawn("panicky", |_shutdown_rx| async move {
            let explode = true;
            if explode {
                panic!("boom");
            }
            Ok(())
        });
        match handle.join().await {
            Err(GloveError::ReaderPanicked(label)) => assert_eq!(label, "panicky"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
