//! Collection pipeline.
//!
//! Probes run as independent scheduler tasks owned by a [`ProbeRegistry`].
//! Successful executions are pushed into one bounded MPSC channel that a
//! single [`Dispatcher`] drains into the metrics sink.
//!
//! # Example
//!
//! ```rust,no_run
//! use mambo::{AppConfig, Pipeline};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load("mambo.yaml")?;
//! let pipeline = Pipeline::from_config(&config).await?;
//! tokio::signal::ctrl_c().await?;
//! let report = pipeline.shutdown().await?;
//! println!("sent {} samples", report.dispatch.sent);
//! # Ok(())
//! # }
//! ```

mod dispatcher;
mod registry;
mod scheduler;

pub use dispatcher::{DispatchStats, Dispatcher, SAMPLE_RATE};
pub use registry::{DEFAULT_SHUTDOWN_TIMEOUT, JobInfo, ProbeRegistry, ShutdownReport, StoppedJob};
pub use scheduler::ProbeStats;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::config::{AppConfig, SourceConfig};
use crate::probe::Probe;
use crate::sink::{MetricSink, StatsdSink};
use crate::source::{MySqlSource, PooledMySqlSource, QueryExecutor, ScalarSource};

/// Errors that can occur while starting or stopping the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A probe cannot be scheduled.
    #[error("config error: {0}")]
    Config(String),

    /// No job with this ID is registered.
    #[error("job not found: {0}")]
    NotFound(uuid::Uuid),

    /// A pipeline task failed.
    #[error("task error: {0}")]
    Task(String),
}

/// Final counters of a stopped pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub probes: ShutdownReport,
    pub dispatch: DispatchStats,
}

/// Build the scalar source selected by the configuration.
///
/// Must be called from within a Tokio runtime when `pool_size` is set.
pub fn source_for(config: &SourceConfig) -> Arc<dyn ScalarSource> {
    match config.pool_size {
        Some(size) => Arc::new(PooledMySqlSource::new(config, size)),
        None => Arc::new(MySqlSource::new(config)),
    }
}

/// A running registry plus its dispatcher task.
pub struct Pipeline {
    registry: ProbeRegistry,
    dispatcher: JoinHandle<DispatchStats>,
    executor: QueryExecutor,
}

impl Pipeline {
    /// Start the pipeline with the MySQL source and StatsD sink from `config`.
    ///
    /// Disabled probes are skipped.
    pub async fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        tracing::info!(
            source = %config.source.masked_dsn(),
            sink = %config.sink.address(),
            "Connecting endpoints"
        );

        let endpoints = config.endpoints();
        let source = source_for(&endpoints.source);
        let sink: Arc<dyn MetricSink> = Arc::new(StatsdSink::new(&endpoints.sink));
        let probes: Vec<Probe> = config.probe_set().enabled().cloned().collect();

        Self::start(probes, source, sink, config.channel_capacity).await
    }

    /// Start one scheduler per probe and the dispatcher.
    ///
    /// If any probe is rejected, probes already started are stopped again
    /// before the error is returned.
    pub async fn start(
        probes: impl IntoIterator<Item = Probe>,
        source: Arc<dyn ScalarSource>,
        sink: Arc<dyn MetricSink>,
        channel_capacity: usize,
    ) -> Result<Self, PipelineError> {
        if channel_capacity == 0 {
            return Err(PipelineError::Config(
                "channel_capacity must be positive".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel(channel_capacity);
        let dispatcher = tokio::spawn(
            Dispatcher::new(sink, rx)
                .run()
                .instrument(tracing::info_span!("dispatcher")),
        );

        let executor = QueryExecutor::new(source);
        let pipeline = Self {
            registry: ProbeRegistry::new(executor.clone(), tx),
            dispatcher,
            executor,
        };

        for probe in probes {
            if let Err(e) = pipeline.registry.spawn(probe).await {
                if let Err(shutdown_err) = pipeline.shutdown().await {
                    tracing::error!(
                        error = %shutdown_err,
                        "Failed to stop partially started pipeline"
                    );
                }
                return Err(e);
            }
        }

        tracing::info!(
            probes = pipeline.registry.job_count().await,
            "Collection pipeline running"
        );
        Ok(pipeline)
    }

    /// The registry supervising the scheduler tasks.
    pub fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    /// Stop all probes with the default grace period, then drain the dispatcher.
    pub async fn shutdown(self) -> Result<PipelineReport, PipelineError> {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    /// Stop all probes, waiting at most `timeout` for executions in flight.
    ///
    /// Samples already queued are still delivered before this returns. The
    /// source is closed last, whether or not the dispatcher ended cleanly.
    pub async fn shutdown_with_timeout(
        self,
        timeout: Duration,
    ) -> Result<PipelineReport, PipelineError> {
        let probes = self.registry.shutdown_with_timeout(timeout).await;
        let dispatch = self.dispatcher.await;
        self.executor.close().await;

        let dispatch = dispatch.map_err(|e| PipelineError::Task(e.to_string()))?;
        Ok(PipelineReport { probes, dispatch })
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("registry", &self.registry)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}
