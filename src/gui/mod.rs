//! Renderers
//!
//! - [`window`] - eframe/egui window, one bar per finger
//! - [`console`] - headless renderer logging text gauges
//! - [`layout`] - bar geometry and the magnitude-to-fill rule shared by both

pub mod console;
pub mod layout;
pub mod window;

pub use console::ConsoleRenderer;
pub use window::{run_window, GloveDisplay};
