//! Configuration loading and typed config structures for the controller.
//!
//! The canonical configuration lives in `lattice-config.yaml` at the
//! project root. This module defines strongly-typed structs mirroring the
//! YAML structure and a loader that reads the file, with environment
//! overrides for deployment-specific values.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use lattice_types::Params;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level controller configuration.
///
/// Mirrors the structure of `lattice-config.yaml`. All fields have
/// defaults, so an empty or missing file yields a usable configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ControllerConfig {
    /// Run parameters handed to the worker.
    #[serde(default)]
    pub run: RunConfig,

    /// Progress poller settings.
    #[serde(default)]
    pub poller: PollerConfig,

    /// Infrastructure connection settings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ControllerConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `NATS_URL` overrides `infrastructure.nats_url`
    /// - `LATTICE_IMAGE_DIR` overrides `infrastructure.image_dir`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }
}

/// Run parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Grid height in cells.
    #[serde(default = "default_image_height")]
    pub image_height: usize,

    /// Grid width in cells.
    #[serde(default = "default_image_width")]
    pub image_width: usize,

    /// Total turns to evolve.
    #[serde(default = "default_turns")]
    pub turns: u64,

    /// Advisory worker parallelism hint.
    #[serde(default = "default_threads")]
    pub threads: usize,
}

impl RunConfig {
    /// The immutable [`Params`] handed to the worker.
    pub const fn params(&self) -> Params {
        Params {
            image_height: self.image_height,
            image_width: self.image_width,
            turns: self.turns,
            threads: self.threads,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            image_height: default_image_height(),
            image_width: default_image_width(),
            turns: default_turns(),
            threads: default_threads(),
        }
    }
}

/// Progress poller settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PollerConfig {
    /// Milliseconds between progress probes.
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
}

impl PollerConfig {
    /// The probe period as a [`Duration`].
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Infrastructure connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// NATS messaging URL for the worker connection.
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// Directory world images are read from and written to.
    #[serde(default = "default_image_dir")]
    pub image_dir: String,
}

impl InfrastructureConfig {
    /// Override infrastructure values with environment variables when set.
    ///
    /// This allows Docker Compose (or any deployment) to set connection
    /// strings without modifying the YAML config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("NATS_URL") {
            self.nats_url = val;
        }
        if let Ok(val) = std::env::var("LATTICE_IMAGE_DIR") {
            self.image_dir = val;
        }
    }
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            nats_url: default_nats_url(),
            image_dir: default_image_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_image_height() -> usize {
    512
}

const fn default_image_width() -> usize {
    512
}

const fn default_turns() -> u64 {
    1000
}

const fn default_threads() -> usize {
    8
}

const fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_owned()
}

fn default_image_dir() -> String {
    "images".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ControllerConfig::default();
        assert_eq!(config.run.image_height, 512);
        assert_eq!(config.run.turns, 1000);
        assert_eq!(config.poller.interval_ms, 2000);
        assert_eq!(config.infrastructure.image_dir, "images");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
run:
  image_height: 64
  image_width: 64
  turns: 100
  threads: 4

poller:
  interval_ms: 500

infrastructure:
  nats_url: nats://testhost:4222
  image_dir: out

logging:
  level: debug
";
        let config = ControllerConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.run.image_height, 64);
        assert_eq!(config.run.turns, 100);
        assert_eq!(config.poller.interval(), Duration::from_millis(500));
        assert_eq!(config.logging.level, "debug");

        let params = config.run.params();
        assert_eq!(params.image_width, 64);
        assert_eq!(params.threads, 4);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "run:\n  turns: 7\n";
        let config = ControllerConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        // Turns is overridden
        assert_eq!(config.run.turns, 7);
        // Everything else uses defaults
        assert_eq!(config.run.image_height, 512);
        assert_eq!(config.poller.interval_ms, 2000);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = ControllerConfig::parse("");
        assert!(config.is_ok());
    }
}
