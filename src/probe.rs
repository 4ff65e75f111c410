//! Probe definitions.
//!
//! A [`Probe`] names a metric, the scalar query that produces its value and
//! how often to run it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::validate_metric_name;

/// Longest accepted interval or timeout (one year).
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn default_enabled() -> bool {
    true
}

/// One scheduled unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Probe {
    /// Metric name sent to the sink.
    pub name: String,
    /// Query expected to yield one row with one integer column.
    pub query: String,
    /// Time between executions.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Optional deadline for one execution. No deadline when absent.
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// Enable this probe (default: true).
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Probe {
    /// Create a new probe.
    pub fn new(name: impl Into<String>, query: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            interval,
            timeout: None,
            enabled: true,
        }
    }

    /// Set the execution deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Validate the probe.
    pub fn validate(&self) -> Result<(), String> {
        validate_metric_name(&self.name)?;
        if self.query.trim().is_empty() {
            return Err("query cannot be empty".to_string());
        }
        if self.interval.is_zero() {
            return Err("interval must be greater than zero".to_string());
        }
        if self.interval > MAX_INTERVAL {
            return Err(format!(
                "interval must not exceed {}",
                humantime::format_duration(MAX_INTERVAL)
            ));
        }
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err("timeout must be greater than zero".to_string());
            }
            if timeout > MAX_INTERVAL {
                return Err(format!(
                    "timeout must not exceed {}",
                    humantime::format_duration(MAX_INTERVAL)
                ));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} every {}",
            self.name,
            humantime::format_duration(self.interval)
        )
    }
}
