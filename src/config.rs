//! Configuration module for mambo.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Data source settings (host or local socket, credentials, pool size)
//! - Sink settings (StatsD host, port, prefix)
//! - Probe definitions (name, query, interval, timeout), inline or from a directory

mod app;
mod endpoint;
mod probes;
mod validation;

pub use app::{AppConfig, DEFAULT_CHANNEL_CAPACITY};
pub use endpoint::{
    DEFAULT_SINK_PORT, DEFAULT_SOURCE_PORT, DEFAULT_SOURCE_SOCKET, EndpointConfig, SinkConfig,
    SourceConfig, port_or_default,
};
pub use probes::ProbesConfig;
pub use validation::{ConfigError, expand_env_vars, validate_metric_name};
