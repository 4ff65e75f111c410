//! Probe list configuration.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::probe::Probe;

use super::validation::ConfigError;

/// Probes declared in a configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbesConfig {
    #[serde(default)]
    pub probes: Vec<Probe>,
}

impl ProbesConfig {
    /// Merge another ProbesConfig into this one.
    #[must_use]
    pub fn merge(mut self, other: ProbesConfig) -> Self {
        self.probes.extend(other.probes);
        self
    }

    /// Validate every probe and reject duplicate names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen_names = HashSet::new();

        for probe in &self.probes {
            probe.validate().map_err(|e| {
                ConfigError::ValidationError(format!("probe '{}': {}", probe.name, e))
            })?;
            if !seen_names.insert(&probe.name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate probe name: '{}'",
                    probe.name
                )));
            }
        }

        Ok(())
    }

    /// Probes that should be scheduled.
    pub fn enabled(&self) -> impl Iterator<Item = &Probe> {
        self.probes.iter().filter(|p| p.enabled)
    }

    /// Load probe definitions from all YAML files in a directory.
    ///
    /// Files are read in file-name order so the resulting probe order is stable.
    pub fn load_from_dir(dir_path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir_path.as_ref();
        if !dir.exists() {
            return Err(ConfigError::ValidationError(format!(
                "probe_path '{}' does not exist",
                dir.display()
            )));
        }
        if !dir.is_dir() {
            return Err(ConfigError::ValidationError(format!(
                "probe_path '{}' is not a directory",
                dir.display()
            )));
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if ext == "yaml" || ext == "yml" {
                paths.push(path);
            }
        }
        paths.sort();

        let mut merged = Self::default();
        for path in paths {
            tracing::debug!("Loading probe config from: {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let file_config: Self = serde_yaml::from_str(&content).map_err(|e| {
                ConfigError::ValidationError(format!("failed to parse '{}': {}", path.display(), e))
            })?;

            merged = merged.merge(file_config);
        }

        Ok(merged)
    }
}
