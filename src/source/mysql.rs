//! MySQL scalar sources using sqlx.
//!
//! Queries without bind arguments run over the MySQL text protocol, so every
//! column arrives as text regardless of its SQL type and can be read as a
//! string before integer parsing.

use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Connection, Executor, Row};

use crate::config::SourceConfig;
use crate::source::{ProbeError, ScalarSource};

/// How long a pooled execution waits for a connection before failing.
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Build sqlx connect options from the source configuration.
///
/// Local-socket mode connects through `config.socket` and ignores the port.
pub fn connect_options(config: &SourceConfig) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new().username(&config.user);

    if !config.password.is_empty() {
        options = options.password(&config.password);
    }
    if !config.database.is_empty() {
        options = options.database(&config.database);
    }

    if config.is_local_socket() {
        options.socket(&config.socket)
    } else {
        options.host(&config.host).port(config.resolved_port())
    }
}

/// Run the probe steps on an acquired connection, stopping at the first failure.
async fn query_scalar(conn: &mut MySqlConnection, query: &str) -> Result<String, ProbeError> {
    conn.ping().await.map_err(ProbeError::Connect)?;

    (&mut *conn)
        .prepare(query)
        .await
        .map_err(ProbeError::Prepare)?;

    let row = (&mut *conn)
        .fetch_optional(query)
        .await
        .map_err(ProbeError::Query)?
        .ok_or(ProbeError::NoRows)?;

    first_column_text(&row)
}

fn first_column_text(row: &MySqlRow) -> Result<String, ProbeError> {
    let value: Option<String> = row.try_get_unchecked(0).map_err(ProbeError::Query)?;
    value.ok_or(ProbeError::Null)
}

/// Opens a fresh connection for every execution and closes it afterwards.
pub struct MySqlSource {
    options: MySqlConnectOptions,
}

impl MySqlSource {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            options: connect_options(config),
        }
    }
}

impl std::fmt::Debug for MySqlSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlSource").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl ScalarSource for MySqlSource {
    fn kind(&self) -> &str {
        "mysql"
    }

    async fn fetch_scalar(&self, query: &str) -> Result<String, ProbeError> {
        let mut conn = MySqlConnection::connect_with(&self.options)
            .await
            .map_err(ProbeError::Connect)?;

        let result = query_scalar(&mut conn, query).await;

        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "Failed to close MySQL connection cleanly");
        }

        result
    }
}

/// Checks a connection out of a shared pool for every execution.
///
/// The pool connects lazily, so an unreachable server surfaces as a
/// per-execution [`ProbeError::Connect`] rather than a startup failure.
#[derive(Clone)]
pub struct PooledMySqlSource {
    pool: MySqlPool,
}

impl PooledMySqlSource {
    pub fn new(config: &SourceConfig, max_connections: u32) -> Self {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(DEFAULT_ACQUIRE_TIMEOUT)
            .connect_lazy_with(connect_options(config));

        Self::from_pool(pool)
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Check if the pool is closed.
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

impl std::fmt::Debug for PooledMySqlSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledMySqlSource")
            .field("size", &self.pool.size())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl ScalarSource for PooledMySqlSource {
    fn kind(&self) -> &str {
        "mysql-pool"
    }

    async fn fetch_scalar(&self, query: &str) -> Result<String, ProbeError> {
        let mut conn = self.pool.acquire().await.map_err(ProbeError::Connect)?;
        // Dropping the checked-out connection returns it to the pool.
        query_scalar(&mut conn, query).await
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("MySQL pool closed");
    }
}
