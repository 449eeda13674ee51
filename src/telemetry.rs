//! Logging setup.
//!
//! One `tracing-subscriber` registry with a single formatting layer. The level
//! comes from `application.log_level` unless `RUST_LOG` is set; the layout
//! comes from `application.log_format` (`--log-format` on the command line).
//!
//! ```no_run
//! use glove_monitor::{config::GloveConfig, telemetry};
//!
//! let config = GloveConfig::load()?;
//! telemetry::init_from_config(&config)?;
//! tracing::info!(hand = "right", "connected");
//! # Ok::<(), glove_monitor::GloveError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::IsTerminal;
use tracing::Level;
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

use crate::config::GloveConfig;
use crate::error::{GloveError, GloveResult};

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, for reading a session by eye
    Pretty,
    /// One line per event
    #[default]
    Compact,
    /// One JSON object per event, for log collectors
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        })
    }
}

/// Resolved logging options.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Default level when `RUST_LOG` is unset
    pub level: Level,
    /// Line layout
    pub format: LogFormat,
    /// Colour output; ignored for JSON.
    pub ansi: bool,
    /// Print `file:line` with each event.
    pub source_location: bool,
}

impl TelemetryConfig {
    /// Derive logging options from the application config.
    ///
    /// Colour is used only when stdout is a terminal. Source locations are
    /// shown at `debug` and `trace`.
    pub fn from_config(config: &GloveConfig) -> GloveResult<Self> {
        let level = parse_log_level(&config.application.log_level)?;
        Ok(Self {
            level,
            format: config.application.log_format,
            ansi: std::io::stdout().is_terminal(),
            source_location: level >= Level::DEBUG,
        })
    }
}

/// Install the global subscriber described by `config`.
pub fn init_from_config(config: &GloveConfig) -> GloveResult<()> {
    init(&TelemetryConfig::from_config(config)?)
}

/// Install the global subscriber.
///
/// Does nothing if a subscriber is already installed (tests, embedding).
pub fn init(config: &TelemetryConfig) -> GloveResult<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.level).into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(format_layer(config).with_filter(filter))
        .try_init()
        .map_err(|err| GloveError::Telemetry(err.to_string()))
}

fn format_layer(config: &TelemetryConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = tracing_subscriber::fmt::layer()
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    match config.format {
        LogFormat::Pretty => layer.pretty().with_ansi(config.ansi).boxed(),
        LogFormat::Compact => layer.compact().with_ansi(config.ansi).boxed(),
        LogFormat::Json => layer.json().with_ansi(false).boxed(),
    }
}

/// Parse a level name, case-insensitively.
pub fn parse_log_level(level: &str) -> GloveResult<Level> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(GloveError::Configuration(format!(
            "Invalid log_level '{}'. Must be one of: trace, debug, info, warn, error",
            level
        ))),
    }
}
