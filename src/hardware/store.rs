//! Shared reading store.
//!
//! Holds the latest flex magnitude for each of the ten fingers and fans out
//! change notifications. One store is created at startup and shared via
//! `Arc` with every reader loop and the renderer.
//!
//! Values live in per-finger atomics: each finger is only ever written by the
//! reader loop owning its hand, and renderers read concurrently. Notifications
//! carry only the `FingerId`; subscribers read the value back from the store,
//! so a slow subscriber always sees the most recent magnitude. A
//! [`ChangeWatcher`] keeps one pending flag per finger: repeated changes to a
//! finger it has not collected yet collapse into one, so a watcher that falls
//! behind never holds more than ten notifications.
//!
//! # Example
//!
//! ```rust
//! use glove_monitor::hardware::{FingerId, ReadingStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(ReadingStore::new());
//! let mut changes = store.watch_changes();
//!
//! store.set(FingerId::LeftRing, 2048);
//! assert_eq!(store.get(FingerId::LeftRing), 2048);
//! assert_eq!(changes.try_recv(), Some(FingerId::LeftRing));
//! assert_eq!(changes.try_recv(), None);
//! ```

use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tokio::sync::Notify;
use tracing::trace;

use crate::hardware::finger::FingerId;
use crate::hardware::frame::{Reading, MAX_MAGNITUDE};

/// Callback invoked with the finger that just changed.
pub type ChangeListener = Arc<dyn Fn(FingerId) + Send + Sync>;

/// Handle returned by [`ReadingStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Latest magnitude per finger plus change notification.
pub struct ReadingStore {
    values: [AtomicU16; FingerId::COUNT],
    listeners: RwLock<Vec<(SubscriptionId, ChangeListener)>>,
    watchers: RwLock<Vec<Weak<PendingChanges>>>,
    next_id: AtomicU64,
}

impl ReadingStore {
    /// Create a store with every finger at 0.
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|_| AtomicU16::new(0)),
            listeners: RwLock::new(Vec::new()),
            watchers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Overwrite `finger`'s magnitude and notify every subscriber.
    ///
    /// All listeners have run and all watch channels have been fed by the
    /// time this returns. Identical consecutive values are not de-duplicated.
    pub fn set(&self, finger: FingerId, magnitude: u16) {
        let magnitude = magnitude.min(MAX_MAGNITUDE);
        self.values[finger.ordinal()].store(magnitude, Ordering::Release);
        trace!(finger = %finger, magnitude, "reading stored");
        self.notify(finger);
    }

    /// Store a decoded reading.
    pub fn record(&self, reading: Reading) {
        self.set(reading.finger, reading.magnitude);
    }

    /// Most recently stored magnitude for `finger` (0 if never set).
    pub fn get(&self, finger: FingerId) -> u16 {
        self.values[finger.ordinal()].load(Ordering::Acquire)
    }

    /// All ten magnitudes in `FingerId` order.
    pub fn snapshot(&self) -> [u16; FingerId::COUNT] {
        std::array::from_fn(|i| self.values[i].load(Ordering::Acquire))
    }

    /// Register a callback run synchronously on every `set`.
    ///
    /// The callback runs on the writer's thread and must not block.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(FingerId) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Await changed `FingerId`s.
    ///
    /// Dropping the watcher ends the subscription.
    pub fn watch_changes(&self) -> ChangeWatcher {
        let pending = Arc::new(PendingChanges::default());
        self.watchers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::downgrade(&pending));
        ChangeWatcher { pending }
    }

    /// Number of live callback and channel subscriptions.
    pub fn subscriber_count(&self) -> usize {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        let watchers = self
            .watchers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|watcher| watcher.strong_count() > 0)
            .count();
        listeners + watchers
    }

    fn notify(&self, finger: FingerId) {
        // Clone out of the lock so a listener may (un)subscribe.
        let listeners: Vec<ChangeListener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(finger);
        }

        let mut closed = false;
        for watcher in self
            .watchers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            match watcher.upgrade() {
                Some(pending) => pending.mark(finger),
                None => closed = true,
            }
        }
        if closed {
            self.watchers
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|watcher| watcher.strong_count() > 0);
        }
    }
}

/// Fingers changed since the watcher last collected them, one bit each.
#[derive(Debug, Default)]
struct PendingChanges {
    fingers: AtomicU16,
    wake: Notify,
}

impl PendingChanges {
    fn mark(&self, finger: FingerId) {
        self.fingers
            .fetch_or(1 << finger.ordinal(), Ordering::AcqRel);
        self.wake.notify_one();
    }

    fn take(&self) -> Option<FingerId> {
        let mut bits = self.fingers.load(Ordering::Acquire);
        while bits != 0 {
            let ordinal = bits.trailing_zeros();
            let rest = bits & !(1 << ordinal);
            match self
                .fingers
                .compare_exchange_weak(bits, rest, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return FingerId::from_ordinal(ordinal as u8),
                Err(actual) => bits = actual,
            }
        }
        None
    }
}

/// Receiving end of [`ReadingStore::watch_changes`].
///
/// Changes are coalesced per finger and handed out lowest `FingerId` first.
/// Read the value back with [`ReadingStore::get`].
#[derive(Debug)]
pub struct ChangeWatcher {
    pending: Arc<PendingChanges>,
}

impl ChangeWatcher {
    /// Wait for the next changed finger.
    pub async fn recv(&mut self) -> FingerId {
        loop {
            if let Some(finger) = self.pending.take() {
                return finger;
            }
            self.pending.wake.notified().await;
        }
    }

    /// Next changed finger, if any is pending.
    pub fn try_recv(&mut self) -> Option<FingerId> {
        self.pending.take()
    }
}

impl Default for ReadingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReadingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadingStore")
            .field("values", &self.snapshot())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
