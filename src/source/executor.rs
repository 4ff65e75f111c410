//! Single probe execution.

use std::sync::Arc;

use crate::probe::Probe;
use crate::sample::Sample;
use crate::source::{ProbeError, ScalarSource};

/// Executes one probe against a [`ScalarSource`] and builds its [`Sample`].
///
/// Cloning is cheap; all clones share the same source.
#[derive(Clone)]
pub struct QueryExecutor {
    source: Arc<dyn ScalarSource>,
}

impl QueryExecutor {
    pub fn new(source: Arc<dyn ScalarSource>) -> Self {
        Self { source }
    }

    /// Strategy name of the underlying source.
    pub fn source_kind(&self) -> &str {
        self.source.kind()
    }

    /// Close the underlying source.
    pub async fn close(&self) {
        self.source.close().await;
    }

    /// Run the probe's query once.
    ///
    /// Without a probe timeout the call waits as long as the source does.
    ///
    /// # Errors
    /// Returns the first failing step as a [`ProbeError`]; nothing is returned
    /// for partial results.
    pub async fn execute(&self, probe: &Probe) -> Result<Sample, ProbeError> {
        let fetch = self.source.fetch_scalar(&probe.query);

        let raw = match probe.timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| ProbeError::Timeout(limit))??,
            None => fetch.await?,
        };

        let value = Sample::parse_value(&raw).map_err(|source| ProbeError::Parse {
            value: raw.clone(),
            source,
        })?;

        Ok(Sample::new(probe.name.clone(), value))
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("source", &self.source.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Returns a fixed result, optionally after a delay.
    struct FixedSource {
        result: Result<&'static str, fn() -> ProbeError>,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl ScalarSource for FixedSource {
        fn kind(&self) -> &str {
            "fixed"
        }

        async fn fetch_scalar(&self, _query: &str) -> Result<String, ProbeError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.result {
                Ok(v) => Ok(v.to_string()),
                Err(make) => Err(make()),
            }
        }
    }

    fn executor(result: Result<&'static str, fn() -> ProbeError>) -> QueryExecutor {
        QueryExecutor::new(Arc::new(FixedSource {
            result,
            delay: Duration::ZERO,
        }))
    }

    fn probe() -> Probe {
        Probe::new("mysql.server.query1", "SELECT 42", Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_execute_success() {
        let sample = executor(Ok("42")).execute(&probe()).await.unwrap();
        assert_eq!(sample, Sample::new("mysql.server.query1", 42));
    }

    #[tokio::test]
    async fn test_execute_parse_failure() {
        let err = executor(Ok("forty-two"))
            .execute(&probe())
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Parse { ref value, .. } if value == "forty-two"));
    }

    #[tokio::test]
    async fn test_execute_propagates_source_error() {
        let err = executor(Err(|| ProbeError::NoRows))
            .execute(&probe())
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::NoRows));

        let err = executor(Err(|| ProbeError::Prepare(sqlx::Error::RowNotFound)))
            .execute(&probe())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "prepare");
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_timeout() {
        let executor = QueryExecutor::new(Arc::new(FixedSource {
            result: Ok("1"),
            delay: Duration::from_secs(10),
        }));
        let probe = probe().with_timeout(Duration::from_millis(200));

        let err = executor.execute(&probe).await.unwrap_err();
        assert!(matches!(err, ProbeError::Timeout(d) if d == Duration::from_millis(200)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_without_timeout_waits() {
        let executor = QueryExecutor::new(Arc::new(FixedSource {
            result: Ok("7"),
            delay: Duration::from_secs(3600),
        }));

        let sample = executor.execute(&probe()).await.unwrap();
        assert_eq!(sample.value, 7);
    }

    #[test]
    fn test_executor_debug() {
        let executor = executor(Ok("1"));
        assert_eq!(executor.source_kind(), "fixed");
        assert!(format!("{executor:?}").contains("fixed"));
    }
}
