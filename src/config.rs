//! Configuration System using Figment
//!
//! This module provides strongly-typed configuration loading for the glove monitor.
//! Configuration is layered from:
//! 1. Built-in defaults
//! 2. `config/glove.toml` (or an explicit path)
//! 3. Environment variables (prefixed with `GLOVE_`, `__` between nested keys)
//!
//! # Example
//! ```no_run
//! use glove_monitor::config::GloveConfig;
//!
//! let config = GloveConfig::load()?;
//! config.validate()?;
//! for glove in config.enabled_gloves() {
//!     println!("{} glove at {}:{}", glove.hand, glove.address, glove.channel);
//! }
//! # Ok::<(), glove_monitor::GloveError>(())
//! ```
//!
//! A typical file:
//!
//! ```toml
//! [application]
//! log_level = "debug"
//! log_format = "json"
//!
//! [test_server]
//! port = 8888
//!
//! [[gloves]]
//! hand = "r"
//! address = "00:06:66:8C:D3:66"
//! channel = 1
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GloveError, GloveResult};
use crate::hardware::finger::Hand;
use crate::telemetry::{parse_log_level, LogFormat};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/glove.toml";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GloveConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Socket stand-in settings
    #[serde(default)]
    pub test_server: TestServerConfig,
    /// Bluetooth glove links, at most one enabled per hand
    #[serde(default)]
    pub gloves: Vec<GloveLinkConfig>,
    /// Renderer settings
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log layout (pretty, compact, json)
    #[serde(default)]
    pub log_format: LogFormat,
}

/// TCP stand-in for the gloves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestServerConfig {
    /// Bind host; empty or `0.0.0.0` listens on all interfaces
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// One Bluetooth RFCOMM glove
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GloveLinkConfig {
    /// Which hand this glove is worn on (`r`/`right`, `l`/`left`)
    pub hand: Hand,
    /// Device address, `XX:XX:XX:XX:XX:XX`
    pub address: String,
    /// RFCOMM channel (1-30)
    #[serde(default = "default_channel")]
    pub channel: u8,
    /// Whether this glove is connected at startup
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl GloveLinkConfig {
    /// Human-readable link name used in logs and errors.
    pub fn label(&self) -> String {
        format!("{} glove {}:{}", self.hand, self.address, self.channel)
    }
}

/// Renderer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Window title
    #[serde(default = "default_title")]
    pub title: String,
    /// Log gauges instead of opening a window
    #[serde(default)]
    pub headless: bool,
}

// Default value functions
fn default_name() -> String {
    "Glove Monitor".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8888
}

fn default_channel() -> u8 {
    1
}

fn default_enabled() -> bool {
    true
}

fn default_title() -> String {
    "Glove Test".to_string()
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            headless: false,
        }
    }
}

impl Default for GloveConfig {
    fn default() -> Self {
        Self {
            application: ApplicationConfig::default(),
            test_server: TestServerConfig::default(),
            gloves: Vec::new(),
            display: DisplayConfig::default(),
        }
    }
}

impl GloveConfig {
    /// Load configuration from `config/glove.toml` and environment variables
    ///
    /// Environment variables override the file with prefix `GLOVE_`.
    /// Example: `GLOVE_APPLICATION__LOG_LEVEL=debug`
    pub fn load() -> GloveResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path. A missing file leaves the defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> GloveResult<Self> {
        Ok(Self::figment(path).extract()?)
    }

    fn figment<P: AsRef<Path>>(path: P) -> Figment {
        Figment::from(Serialized::defaults(GloveConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("GLOVE_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> GloveResult<()> {
        parse_log_level(&self.application.log_level)?;

        if self.test_server.port == 0 {
            return Err(GloveError::Configuration(
                "test_server.port must be non-zero".to_string(),
            ));
        }

        for glove in &self.gloves {
            if !is_device_address(&glove.address) {
                return Err(GloveError::Configuration(format!(
                    "Invalid device address '{}' for {} glove. Expected XX:XX:XX:XX:XX:XX",
                    glove.address, glove.hand
                )));
            }
            if !(1..=30).contains(&glove.channel) {
                return Err(GloveError::Configuration(format!(
                    "Invalid RFCOMM channel {} for {} glove. Must be 1-30",
                    glove.channel, glove.hand
                )));
            }
        }

        for hand in Hand::BOTH {
            let enabled = self
                .enabled_gloves()
                .filter(|glove| glove.hand == hand)
                .count();
            if enabled > 1 {
                return Err(GloveError::Configuration(format!(
                    "{} gloves enabled for the {} hand; at most one is allowed",
                    enabled, hand
                )));
            }
        }

        Ok(())
    }

    /// Get all enabled gloves
    pub fn enabled_gloves(&self) -> impl Iterator<Item = &GloveLinkConfig> {
        self.gloves.iter().filter(|glove| glove.enabled)
    }
}

fn is_device_address(address: &str) -> bool {
    let octets: Vec<&str> = address.split(':').collect();
    octets.len() == 6
        && octets
            .iter()
            .all(|octet| octet.len() == 2 && octet.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn right_glove() -> GloveLinkConfig {
        GloveLinkConfig {
            hand: Hand::Right,
            address: "00:06:66:8C:D3:66".to_string(),
            channel: 1,
            enabled: true,
        }
    }

    #[test]
    fn test_defaults_validate() {
        let config = GloveConfig::default();
        assert_eq!(config.test_server.port, 8888);
        assert_eq!(config.display.title, "Glove Test");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [application]
            log_level = "debug"
            log_format = "json"

            [test_server]
            host = "127.0.0.1"
            port = 9000

            [[gloves]]
            hand = "r"
            address = "00:06:66:8C:D3:66"

            [[gloves]]
            hand = "left"
            address = "00:06:66:8C:D3:67"
            channel = 2
            enabled = false
            "#
        )
        .unwrap();

        let config = GloveConfig::load_from(file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.application.log_format, LogFormat::Json);
        assert_eq!(config.application.name, "Glove Monitor");
        assert_eq!(config.test_server.host, "127.0.0.1");
        assert_eq!(config.test_server.port, 9000);
        assert_eq!(config.gloves.len(), 2);
        assert_eq!(config.gloves[0], right_glove());
        assert_eq!(config.gloves[1].hand, Hand::Left);

        let enabled: Vec<_> = config.enabled_gloves().collect();
        assert_eq!(enabled.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GloveConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.test_server.host, "0.0.0.0");
        assert!(config.gloves.is_empty());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = GloveConfig::default();
        config.application.log_level = "loud".to_string();
        assert!(matches!(
            config.validate(),
            Err(GloveError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_address_and_channel() {
        let mut config = GloveConfig::default();
        config.gloves.push(GloveLinkConfig {
            address: "00:06:66:8C:D3".to_string(),
            ..right_glove()
        });
        assert!(config.validate().is_err());

        config.gloves[0] = GloveLinkConfig {
            channel: 31,
            ..right_glove()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_two_gloves_on_one_hand() {
        let mut config = GloveConfig::default();
        config.gloves.push(right_glove());
        config.gloves.push(right_glove());
        assert!(config.validate().is_err());

        config.gloves[1].enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_link_label() {
        assert_eq!(right_glove().label(), "right glove 00:06:66:8C:D3:66:1");
    }
}
