//! Core source traits and error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during one probe execution.
///
/// Every variant aborts the execution; no sample is produced for that tick.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Could not connect to or ping the data source.
    #[error("connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    /// The server rejected the query while preparing it.
    #[error("query preparation failed: {0}")]
    Prepare(#[source] sqlx::Error),

    /// Executing the query or reading its first row failed.
    #[error("query execution failed: {0}")]
    Query(#[source] sqlx::Error),

    /// The query returned no rows.
    #[error("query returned no rows")]
    NoRows,

    /// The first column of the first row was NULL.
    #[error("query returned NULL")]
    Null,

    /// The scalar is not an integer.
    #[error("value {value:?} is not an integer: {source}")]
    Parse {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// The execution exceeded the probe's timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl ProbeError {
    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connect(_) => "connect",
            Self::Prepare(_) => "prepare",
            Self::Query(_) => "query",
            Self::NoRows => "no_rows",
            Self::Null => "null",
            Self::Parse { .. } => "parse",
            Self::Timeout(_) => "timeout",
        }
    }
}

/// Connection strategy for executing a scalar query.
///
/// Implementations own how connections are acquired and released. Each call
/// must release whatever it acquired before returning, on success and on
/// failure, and must never share one connection between concurrent calls.
#[async_trait::async_trait]
pub trait ScalarSource: Send + Sync + 'static {
    /// Strategy name for logs (e.g., "mysql", "mysql-pool").
    fn kind(&self) -> &str;

    /// Execute `query` and return the first column of the first row as text.
    async fn fetch_scalar(&self, query: &str) -> Result<String, ProbeError>;

    /// Release long-lived resources once no more queries will be issued.
    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_error_kinds() {
        assert_eq!(ProbeError::Connect(sqlx::Error::PoolTimedOut).kind(), "connect");
        assert_eq!(ProbeError::NoRows.kind(), "no_rows");
        assert_eq!(
            ProbeError::Timeout(Duration::from_millis(50)).kind(),
            "timeout"
        );

        let err = "x1".parse::<i64>().unwrap_err();
        let parse = ProbeError::Parse {
            value: "x1".to_string(),
            source: err,
        };
        assert_eq!(parse.kind(), "parse");
        assert!(parse.to_string().contains("\"x1\" is not an integer"));
    }
}
