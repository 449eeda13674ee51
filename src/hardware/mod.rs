//! Glove hardware model
//!
//! - [`finger`] - `Hand` and `FingerId`
//! - [`frame`] - 16-bit frame decoder and the Bluetooth poll-frame layout
//! - [`store`] - shared latest-value store with change notification
//! - [`mock`] - simulated glove for tests and the `simulate` command

pub mod finger;
pub mod frame;
pub mod mock;
pub mod store;

pub use finger::{FingerId, Hand, FINGERS_PER_HAND};
pub use frame::{decode, PollFrameUnpacker, RawFrame, Reading};
pub use store::{ChangeWatcher, ReadingStore, SubscriptionId};
