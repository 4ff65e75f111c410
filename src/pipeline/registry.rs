//! Probe registry for managing scheduler task lifecycle.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::pipeline::PipelineError;
use crate::pipeline::scheduler::{ProbeStats, run_probe};
use crate::probe::Probe;
use crate::sample::Sample;
use crate::source::QueryExecutor;

/// Default timeout for graceful shutdown (5 seconds).
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Metadata about a registered job.
#[derive(Debug, Clone)]
pub struct JobInfo {
    /// Job UUID.
    pub id: uuid::Uuid,
    /// Probe name.
    pub name: String,
    /// Schedule description.
    pub schedule: String,
    /// When the scheduler task was spawned.
    pub started_at: DateTime<Utc>,
}

/// Outcome of stopping one job.
#[derive(Debug, Clone)]
pub struct StoppedJob {
    pub info: JobInfo,
    /// Final counters, or `None` if the task was aborted or panicked.
    pub stats: Option<ProbeStats>,
}

/// Outcome of stopping the whole registry.
#[derive(Debug, Clone, Default)]
pub struct ShutdownReport {
    pub jobs: Vec<StoppedJob>,
    /// True if at least one task had to be aborted after the grace period.
    pub timed_out: bool,
}

struct ProbeJob {
    info: JobInfo,
    stop: watch::Sender<bool>,
    handle: JoinHandle<ProbeStats>,
}

/// Supervisor owning one scheduler task per probe.
///
/// Every task shares the same [`QueryExecutor`] and sample channel. Tasks run
/// until [`remove`](Self::remove) or [`shutdown`](Self::shutdown) is called.
pub struct ProbeRegistry {
    executor: QueryExecutor,
    samples: mpsc::Sender<Sample>,
    jobs: RwLock<HashMap<uuid::Uuid, ProbeJob>>,
}

impl ProbeRegistry {
    /// Create a new registry.
    pub fn new(executor: QueryExecutor, samples: mpsc::Sender<Sample>) -> Self {
        Self {
            executor,
            samples,
            jobs: RwLock::new(HashMap::new()),
        }
    }
}

impl std::fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeRegistry")
            .field(
                "job_count",
                &self.jobs.try_read().map(|j| j.len()).unwrap_or(0),
            )
            .finish_non_exhaustive()
    }
}

impl ProbeRegistry {
    /// Validate a probe and spawn its scheduler task.
    ///
    /// # Errors
    /// Returns `PipelineError::Config` if the probe is invalid or a probe with
    /// the same name is already registered.
    pub async fn spawn(&self, probe: Probe) -> Result<uuid::Uuid, PipelineError> {
        probe
            .validate()
            .map_err(|e| PipelineError::Config(format!("probe '{}': {}", probe.name, e)))?;

        let mut jobs = self.jobs.write().await;
        if jobs.values().any(|j| j.info.name == probe.name) {
            return Err(PipelineError::Config(format!(
                "duplicate probe name: '{}'",
                probe.name
            )));
        }

        let id = uuid::Uuid::new_v4();
        let info = JobInfo {
            id,
            name: probe.name.clone(),
            schedule: format!("every {}", humantime::format_duration(probe.interval)),
            started_at: Utc::now(),
        };

        let (stop, stop_rx) = watch::channel(false);
        let span = tracing::info_span!("probe", name = %probe.name);
        let handle = tokio::spawn(
            run_probe(probe, self.executor.clone(), self.samples.clone(), stop_rx).instrument(span),
        );

        tracing::info!(
            probe = %info.name,
            job_id = %id,
            source = self.executor.source_kind(),
            "Probe registered"
        );
        jobs.insert(id, ProbeJob { info, stop, handle });
        Ok(id)
    }

    /// List all registered jobs.
    pub async fn list_jobs(&self) -> Vec<JobInfo> {
        self.jobs
            .read()
            .await
            .values()
            .map(|j| j.info.clone())
            .collect()
    }

    /// Get the number of registered jobs.
    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Stop and remove a specific probe job by ID.
    ///
    /// An execution in flight is given [`DEFAULT_SHUTDOWN_TIMEOUT`] to finish.
    pub async fn remove(&self, job_id: &uuid::Uuid) -> Result<StoppedJob, PipelineError> {
        let job = self
            .jobs
            .write()
            .await
            .remove(job_id)
            .ok_or(PipelineError::NotFound(*job_id))?;

        let _ = job.stop.send(true);
        let deadline = tokio::time::Instant::now() + DEFAULT_SHUTDOWN_TIMEOUT;
        let (stopped, _) = join_job(job, deadline).await;

        tracing::info!(job_id = %job_id, probe = %stopped.info.name, "Probe removed");
        Ok(stopped)
    }

    /// Gracefully stop every probe with the default timeout.
    pub async fn shutdown(self) -> ShutdownReport {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    /// Stop every probe, aborting tasks still running after `timeout`.
    ///
    /// Consumes the registry, which drops its handle on the sample channel.
    pub async fn shutdown_with_timeout(self, timeout: Duration) -> ShutdownReport {
        let jobs: Vec<ProbeJob> = self.jobs.into_inner().into_values().collect();
        let job_count = jobs.len();

        // Signal all first so every task winds down within the same window.
        for job in &jobs {
            let _ = job.stop.send(true);
        }

        let deadline = tokio::time::Instant::now() + timeout;
        let mut report = ShutdownReport::default();
        for job in jobs {
            let (stopped, aborted) = join_job(job, deadline).await;
            report.timed_out |= aborted;
            report.jobs.push(stopped);
        }

        if report.timed_out {
            tracing::warn!(job_count, "Probe registry shutdown timed out");
        } else {
            tracing::info!(job_count, "Probe registry shutdown complete");
        }
        report
    }
}

/// Wait for a signalled job until `deadline`, aborting it afterwards.
///
/// Returns the stopped job and whether it had to be aborted.
async fn join_job(mut job: ProbeJob, deadline: tokio::time::Instant) -> (StoppedJob, bool) {
    let (stats, aborted) = match tokio::time::timeout_at(deadline, &mut job.handle).await {
        Ok(Ok(stats)) => (Some(stats), false),
        Ok(Err(e)) => {
            tracing::error!(probe = %job.info.name, error = %e, "Probe task failed");
            (None, false)
        }
        Err(_) => {
            tracing::warn!(probe = %job.info.name, "Probe did not stop in time, aborting");
            job.handle.abort();
            (None, true)
        }
    };

    (
        StoppedJob {
            info: job.info,
            stats,
        },
        aborted,
    )
}
