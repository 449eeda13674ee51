//! Custom error types for the application.
//!
//! This module defines the primary error type, `GloveError`, for the entire crate.
//! Using the `thiserror` crate, it provides a centralized and consistent way to handle
//! the different kinds of failures that can occur between the glove transports and
//! the display.
//!
//! ## Error Hierarchy
//!
//! - **`InvalidFingerIndex`**: A frame carried a finger index outside 0-4. Recoverable:
//!   the single reading is logged and discarded.
//! - **`MalformedFrame`**: A text command on the socket stand-in could not be parsed
//!   into a hand and a 16-bit frame. Recoverable: the line is logged and discarded.
//! - **`ConnectionLost`**: The transport failed underneath a reader loop. Fatal to that
//!   reader only; the supervisor logs it and everything else keeps running.
//! - **`BindFailure`**: The socket stand-in could not bind its listening endpoint. Fatal
//!   at startup.
//! - **`Config`** / **`Configuration`**: Parse errors from `figment`, and semantic errors
//!   caught by `GloveConfig::validate`.
//! - **`FeatureNotEnabled`**: Functionality that was compiled out (the Bluetooth transport
//!   without `--features bluetooth`).
//!
//! Decode-level errors never escape a reader loop. Connection-level errors terminate
//! only the loop that owns the connection.

use crate::hardware::finger::Hand;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type GloveResult<T> = std::result::Result<T, GloveError>;

/// Every failure the glove monitor reports.
#[derive(Error, Debug)]
pub enum GloveError {
    /// A frame named a finger outside 0-4.
    #[error("Invalid finger index {index} for {hand} hand (expected 0-4)")]
    InvalidFingerIndex {
        /// Hand of the reader that received the frame
        hand: Hand,
        /// Index carried in bits 15..12
        index: u8,
    },

    /// A socket command line could not be parsed.
    #[error("Malformed frame '{line}': {reason}")]
    MalformedFrame {
        /// The offending line, trimmed
        line: String,
        /// What was wrong with it
        reason: String,
    },

    /// The transport under a reader loop failed or was closed by the peer.
    #[error("Connection lost with {link}: {source}")]
    ConnectionLost {
        /// Reader label, e.g. `right glove 00:06:66:8C:D3:66:1`
        link: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The socket stand-in could not listen.
    #[error("Bind failed on {addr}: {source}")]
    BindFailure {
        /// Requested `host:port`
        addr: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be read or deserialized.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// The configuration was read but is not usable.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested functionality was compiled out.
    #[error("Feature '{0}' is not enabled. Please build with --features {0}")]
    FeatureNotEnabled(String),

    /// The global log subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Telemetry(String),

    /// The native window failed to start or crashed.
    #[error("Display error: {0}")]
    Display(String),

    /// A reader task panicked; carries its label.
    #[error("Reader '{0}' panicked")]
    ReaderPanicked(String),

    /// One or more readers ended with an error.
    #[error("Shutdown failed with errors")]
    ShutdownFailed(Vec<GloveError>),
}

impl GloveError {
    /// Build a `MalformedFrame` for `line`.
    pub fn malformed(line: impl Into<String>, reason: impl Into<String>) -> Self {
        GloveError::MalformedFrame {
            line: line.into(),
            reason: reason.into(),
        }
    }

    /// Whether a reader loop may log this error and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GloveError::InvalidFingerIndex { .. } | GloveError::MalformedFrame { .. }
        )
    }
}
