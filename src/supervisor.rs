//! Reader supervision.
//!
//! The supervisor owns the shared [`ReadingStore`] and one [`ReaderHandle`]
//! per transport connection. Reader loops fail independently: a lost glove
//! stops only its own loop, its fingers keep their last values, and the
//! renderer and the other hand carry on. On shutdown every loop is signalled
//! first and then joined, so transports are closed before the process exits.

use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use crate::config::GloveLinkConfig;
use crate::error::{GloveError, GloveResult};
use crate::hardware::finger::Hand;
use crate::hardware::store::ReadingStore;
use crate::link::rfcomm::{run_glove_link, run_link};
use crate::link::socket::TestServer;
use crate::link::ReaderHandle;

/// Owns the reader loops feeding one store.
#[derive(Debug)]
pub struct Supervisor {
    store: Arc<ReadingStore>,
    readers: Vec<ReaderHandle>,
}

impl Supervisor {
    /// A supervisor with no readers yet.
    pub fn new(store: Arc<ReadingStore>) -> Self {
        Self {
            store,
            readers: Vec::new(),
        }
    }

    /// The store every reader writes into.
    pub fn store(&self) -> Arc<ReadingStore> {
        Arc::clone(&self.store)
    }

    /// Serve the TCP stand-in on an already-bound listener.
    pub fn spawn_test_server(&mut self, server: TestServer) {
        let label = format!("test server {}", server.local_addr());
        let store = self.store();
        self.readers.push(ReaderHandle::spawn(label, move |shutdown_rx| {
            server.run(store, shutdown_rx)
        }));
    }

    /// Connect to and poll one Bluetooth glove.
    pub fn spawn_glove(&mut self, link: GloveLinkConfig) {
        let label = link.label();
        let store = self.store();
        self.readers.push(ReaderHandle::spawn(label, move |shutdown_rx| {
            run_glove_link(link, store, shutdown_rx)
        }));
    }

    /// Poll a glove over an already-open stream.
    pub fn spawn_stream<S>(&mut self, label: impl Into<String>, hand: Hand, stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let label = label.into();
        let store = self.store();
        let link_label = label.clone();
        self.readers.push(ReaderHandle::spawn(label, move |shutdown_rx| async move {
            run_link(stream, hand, &link_label, store, shutdown_rx).await
        }));
    }

    /// Labels of every reader, in spawn order.
    pub fn reader_labels(&self) -> Vec<&str> {
        self.readers.iter().map(ReaderHandle::label).collect()
    }

    /// Number of reader loops still running.
    pub fn running(&self) -> usize {
        self.readers.iter().filter(|r| !r.is_finished()).count()
    }

    /// Stop every reader loop and wait for all of them.
    ///
    /// Errors from loops that had already failed (for example `ConnectionLost`)
    /// are collected into `ShutdownFailed`.
    pub async fn shutdown(mut self) -> GloveResult<()> {
        info!(readers = self.readers.len(), "Stopping reader loops");
        for reader in &mut self.readers {
            reader.signal_stop();
        }

        let mut errors = Vec::new();
        for reader in self.readers {
            let label = reader.label().to_string();
            if let Err(err) = reader.join().await {
                warn!(reader = %label, error = %err, "reader ended with an error");
                errors.push(err);
            }
        }

        if errors.is_empty() {
            info!("All readers stopped");
            Ok(())
        } else {
            Err(GloveError::ShutdownFailed(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::MockGlove;

    #[tokio::test]
    async fn shutdown_with_no_readers() {
        let supervisor = Supervisor::new(Arc::new(ReadingStore::new()));
        assert_eq!(supervisor.running(), 0);
        assert!(supervisor.shutdown().await.is_ok());
    }

    #[tokio::test]
    async fn shutdown_stops_held_links() {
        let mut supervisor = Supervisor::new(Arc::new(ReadingStore::new()));
        for hand in Hand::BOTH {
            let (stream, _glove) = MockGlove::scripted(Vec::new()).hold_when_done().spawn();
            supervisor.spawn_stream(format!("{} mock", hand), hand, stream);
        }
        assert_eq!(supervisor.reader_labels(), vec!["right mock", "left mock"]);
        assert!(supervisor.shutdown().await.is_ok());
    }

    #[tokio::test]
    async fn failed_reader_is_reported_at_shutdown() {
        let mut supervisor = Supervisor::new(Arc::new(ReadingStore::new()));
        let (stream, _glove) = MockGlove::scripted(Vec::new()).spawn();
        supervisor.spawn_stream("right mock", Hand::Right, stream);

        match supervisor.shutdown().await {
            // The stop signal may win the race against the disconnect.
            Ok(()) => {}
            Err(GloveError::ShutdownFailed(errors)) => {
                assert!(matches!(errors[0], GloveError::ConnectionLost { .. }));
            }
            Err(other) => panic!("unexpected: {:?}", other),
        }
    }
}
