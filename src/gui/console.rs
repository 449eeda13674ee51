//! Headless renderer: logs a text gauge for every finger change.

use std::future::Future;
use std::sync::Arc;
use tracing::info;

use crate::gui::layout::fill_fraction;
use crate::hardware::finger::FingerId;
use crate::hardware::store::{ChangeWatcher, ReadingStore};

/// Characters per text gauge.
const GAUGE_WIDTH: usize = 20;

/// Logs store changes until stopped.
pub struct ConsoleRenderer {
    store: Arc<ReadingStore>,
    changes: ChangeWatcher,
}

impl ConsoleRenderer {
    /// Start watching `store`; nothing is logged until [`Self::run_until`].
    pub fn new(store: Arc<ReadingStore>) -> Self {
        let changes = store.watch_changes();
        Self { store, changes }
    }

    /// Render until `stop` completes.
    pub async fn run_until<F>(mut self, stop: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);
        loop {
            tokio::select! {
                _ = &mut stop => break,
                finger = self.changes.recv() => {
                    let magnitude = self.store.get(finger);
                    info!(target: "glove_monitor::display", "{}", gauge(finger, magnitude));
                }
            }
        }
    }
}

/// One-line gauge, e.g. `R-Index  [##########          ] 2048`.
pub fn gauge(finger: FingerId, magnitude: u16) -> String {
    let filled = (fill_fraction(magnitude) * GAUGE_WIDTH as f32).round() as usize;
    format!(
        "{:<8} [{}{}] {}",
        finger.label(),
        "#".repeat(filled),
        " ".repeat(GAUGE_WIDTH - filled),
        magnitude
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_scales_with_magnitude() {
        assert_eq!(
            gauge(FingerId::RightIndex, 0),
            format!("R-Index  [{}] 0", " ".repeat(GAUGE_WIDTH))
        );
        assert_eq!(
            gauge(FingerId::LeftPinky, 2048),
            format!("L-Pinky  [{}{}] 2048", "#".repeat(10), " ".repeat(10))
        );
        assert!(gauge(FingerId::LeftThumb, 4095).contains(&"#".repeat(GAUGE_WIDTH)));
    }

    #[tokio::test]
    async fn renderer_stops_on_signal() {
        let store = Arc::new(ReadingStore::new());
        let renderer = ConsoleRenderer::new(store.clone());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let task = tokio::spawn(renderer.run_until(async {
            let _ = rx.await;
        }));
        store.set(FingerId::RightThumb, 10);
        tx.send(()).unwrap();
        task.await.unwrap();
    }
}
