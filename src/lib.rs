//! Mambo - MySQL to StatsD metric collector
//!
//! This crate runs a set of probes, each a scalar SQL query on its own
//! interval, and forwards every result as a StatsD counter increment.
//! It can be used as a library, or run as a standalone binary with the
//! `mambo` executable.
//!
//! # Architecture
//!
//! - **Config**: YAML configuration with environment expansion and a probe directory
//! - **Source**: MySQL scalar query execution, per-call or pooled connections
//! - **Pipeline**: One scheduler task per probe, fan-in channel, single dispatcher
//! - **Sink**: StatsD counters over UDP
//!
//! # Example
//!
//! ```rust,no_run
//! use mambo::{AppConfig, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load("mambo.yaml")?;
//!     let pipeline = Pipeline::from_config(&config).await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     pipeline.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod pipeline;
pub mod probe;
pub mod sample;
pub mod sink;
pub mod source;

pub use config::{AppConfig, ConfigError, SinkConfig, SourceConfig};
pub use pipeline::{Pipeline, PipelineError, PipelineReport, ProbeRegistry};
pub use probe::Probe;
pub use sample::{Sample, SampleParseError};
pub use sink::{MetricSink, SinkError, StatsdSink};
pub use source::{MySqlSource, PooledMySqlSource, ProbeError, QueryExecutor, ScalarSource};
