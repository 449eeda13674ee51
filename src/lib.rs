//! # Glove Monitor Core Library
//!
//! Live visualizer for a two-handed flex-sensor glove rig. Each glove reports
//! five finger readings as 16-bit frames; reader loops decode them into a
//! shared store and a renderer draws one bar per finger.
//!
//! ```text
//! transport bytes -> frame decoder -> ReadingStore::set -> notify -> renderer
//! ```
//!
//! ## Crate Structure
//!
//! - **`hardware`**: `Hand`/`FingerId`, the 16-bit frame decoder and poll-frame
//!   layout, the shared `ReadingStore`, and a simulated glove.
//! - **`link`**: Reader loops. `socket` is the TCP text stand-in, `rfcomm`
//!   polls a Bluetooth glove.
//! - **`supervisor`**: Starts one reader per connection, stops and joins them.
//! - **`gui`**: The eframe/egui window and a headless console renderer.
//! - **`config`**: Figment-based configuration (TOML + `GLOVE_` env vars).
//! - **`telemetry`**: `tracing-subscriber` setup.
//! - **`error`**: The `GloveError` enum used across the crate.

pub mod config;
pub mod error;
pub mod gui;
pub mod hardware;
pub mod link;
pub mod supervisor;
pub mod telemetry;

pub use error::{GloveError, GloveResult};
pub use hardware::{decode, FingerId, Hand, Reading, ReadingStore};
pub use supervisor::Supervisor;
