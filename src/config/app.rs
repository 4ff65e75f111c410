//! Application configuration structures.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::endpoint::{EndpointConfig, SinkConfig, SourceConfig};
use super::probes::ProbesConfig;
use super::validation::ConfigError;
use crate::probe::Probe;

/// Default capacity of the sample channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Data source connection.
    #[serde(default)]
    pub source: SourceConfig,

    /// Metrics sink connection.
    #[serde(default)]
    pub sink: SinkConfig,

    /// Capacity of the channel between probes and the dispatcher (default: 1024).
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Path to a directory with additional probe files.
    #[serde(default)]
    pub probe_path: Option<String>,

    /// Probes declared inline.
    #[serde(default)]
    pub probes: Vec<Probe>,
}

impl AppConfig {
    /// Create a configuration for the given endpoints and probes.
    pub fn new(endpoints: EndpointConfig, probes: Vec<Probe>) -> Self {
        Self {
            source: endpoints.source,
            sink: endpoints.sink,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            probe_path: None,
            probes,
        }
    }

    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if any file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a YAML file without validating it.
    ///
    /// Environment variables are expanded in endpoint credentials and hosts.
    /// If `probe_path` is set, probe files in that directory are merged in;
    /// a relative `probe_path` is resolved against the config file's directory.
    /// Callers applying overrides must call [`validate`](Self::validate) afterwards.
    ///
    /// # Errors
    /// Returns `ConfigError` if any file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yaml::from_str(&content)?;

        config.source.expand_env();
        config.sink.expand_env();

        if let Some(ref probe_dir) = config.probe_path {
            let probe_dir = match path.parent() {
                Some(base) if Path::new(probe_dir).is_relative() => base.join(probe_dir),
                _ => Path::new(probe_dir).to_path_buf(),
            };
            let additional = ProbesConfig::load_from_dir(&probe_dir)?;
            config.probes.extend(additional.probes);
        }

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.source.validate()?;
        self.sink.validate()?;

        if self.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "channel_capacity must be positive".to_string(),
            ));
        }

        self.probe_set().validate()
    }

    /// Endpoint parameters shared by every probe and the dispatcher.
    pub fn endpoints(&self) -> EndpointConfig {
        EndpointConfig {
            source: self.source.clone(),
            sink: self.sink.clone(),
        }
    }

    /// All configured probes, including disabled ones.
    pub fn probe_set(&self) -> ProbesConfig {
        ProbesConfig {
            probes: self.probes.clone(),
        }
    }
}
