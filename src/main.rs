//! CLI Entry Point for glove-monitor
//!
//! Starts the reader loops for one transport and a renderer on the main thread:
//! - `test-server`: TCP text stand-in for the gloves
//! - `bluetooth`: one RFCOMM link per glove listed in the config file
//! - `simulate`: two simulated gloves, no hardware required
//!
//! # Usage
//!
//! ```bash
//! glove-monitor test-server --port 8888
//! glove-monitor --config config/glove.toml bluetooth
//! glove-monitor --headless --log-format json simulate
//! ```
//!
//! Closing the window (or Esc, or Ctrl+C when headless) stops every reader
//! and waits for it before exiting.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{error, info, warn};

use glove_monitor::config::GloveConfig;
use glove_monitor::gui::{run_window, ConsoleRenderer};
use glove_monitor::hardware::mock::MockGlove;
use glove_monitor::link::socket::TestServer;
use glove_monitor::telemetry::{self, LogFormat};
use glove_monitor::{GloveError, Hand, ReadingStore, Supervisor};

#[derive(Parser)]
#[command(name = "glove-monitor")]
#[command(about = "Live flex-sensor visualizer for the glove rig", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Override the configured log layout
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Log gauges instead of opening a window
    #[arg(long, global = true)]
    headless: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept one TCP client sending "<hand> <hex frame>" lines
    TestServer {
        /// Bind host (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (defaults to the configured port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Poll the Bluetooth gloves listed in the configuration
    Bluetooth,

    /// Drive the display from two simulated gloves
    Simulate {
        /// Delay between simulated poll responses
        #[arg(long, default_value = "20")]
        frame_delay_ms: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => GloveConfig::load_from(path),
        None => GloveConfig::load(),
    }
    .context("Failed to load configuration")?;
    if let Some(level) = &cli.log_level {
        config.application.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.application.log_format = format;
    }
    if cli.headless {
        config.display.headless = true;
    }
    config.validate()?;
    telemetry::init_from_config(&config)?;

    info!("{} starting", config.application.name);

    let runtime = Runtime::new().context("Failed to start tokio runtime")?;
    let store = Arc::new(ReadingStore::new());
    let mut supervisor = Supervisor::new(Arc::clone(&store));

    // Readers are spawned on the runtime; the renderer owns the main thread.
    {
        let _guard = runtime.enter();
        match cli.command {
            Commands::TestServer { host, port } => {
                let host = host.unwrap_or_else(|| config.test_server.host.clone());
                let port = port.unwrap_or(config.test_server.port);
                // Bind failure aborts before anything else starts.
                let server = runtime.block_on(TestServer::bind(&host, port))?;
                supervisor.spawn_test_server(server);
            }
            Commands::Bluetooth => {
                let gloves: Vec<_> = config.enabled_gloves().cloned().collect();
                if gloves.is_empty() {
                    return Err(GloveError::Configuration(
                        "no enabled gloves in configuration".to_string(),
                    )
                    .into());
                }
                for glove in gloves {
                    supervisor.spawn_glove(glove);
                }
            }
            Commands::Simulate { frame_delay_ms } => {
                for hand in Hand::BOTH {
                    let (stream, _glove) = MockGlove::sweep()
                        .with_frame_delay(Duration::from_millis(frame_delay_ms))
                        .spawn();
                    supervisor.spawn_stream(format!("simulated {} glove", hand), hand, stream);
                }
            }
        }
    }
    info!(readers = ?supervisor.reader_labels(), "Reader loops started");

    if config.display.headless {
        let renderer = ConsoleRenderer::new(Arc::clone(&store));
        runtime.block_on(renderer.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "Ctrl+C handler failed");
            }
        }));
    } else if let Err(err) = run_window(Arc::clone(&store), &config.display.title) {
        error!(error = %err, "display exited with an error");
    }

    match runtime.block_on(supervisor.shutdown()) {
        Ok(()) => {}
        Err(GloveError::ShutdownFailed(errors)) => {
            warn!(failed = errors.len(), "Some readers ended with errors");
        }
        Err(err) => return Err(err.into()),
    }

    info!("Connections closed");
    Ok(())
}
