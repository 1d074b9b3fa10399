//! Persistence layer: connection pool, scoped acquisition, SQL file runner,
//! row models, and repositories.

use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgConnection;

pub mod migrate;
pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Connection settings for [`create_pool`].
#[derive(Debug, Clone)]
pub struct DbSettings {
    pub url: String,
    /// Upper bound on open connections.
    pub max_connections: u32,
    /// How long a checkout waits for a free connection before failing.
    pub acquire_timeout: Duration,
}

impl DbSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 20,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Create a bounded connection pool.
pub async fn create_pool(settings: &DbSettings) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .after_connect(|_conn, _meta| {
            Box::pin(async move {
                tracing::debug!("Opened new database connection");
                Ok(())
            })
        })
        .connect(&settings.url)
        .await
}

/// Check out one connection, run `f` on it, and hand it back.
///
/// The connection returns to the pool when the guard drops, which covers the
/// success path, an error returned by `f`, and a panic inside `f`.
/// Connection-level failures are reported as an error event here and then
/// returned to the caller unchanged.
///
/// ```ignore
/// let n: i64 = with_connection(&pool, |conn| {
///     Box::pin(async move { sqlx::query_scalar("SELECT 1").fetch_one(conn).await })
/// })
/// .await?;
/// ```
pub async fn with_connection<T, F>(pool: &DbPool, f: F) -> Result<T, sqlx::Error>
where
    F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, sqlx::Error>>,
{
    let mut conn = pool.acquire().await.inspect_err(report_connection_error)?;
    f(&mut *conn).await.inspect_err(report_connection_error)
}

/// Run a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    with_connection(pool, |conn| {
        Box::pin(async move {
            sqlx::query("SELECT 1").execute(&mut *conn).await?;
            Ok(())
        })
    })
    .await
}

/// `true` when the error concerns the connection itself rather than a
/// statement (constraint violations, missing rows, decode errors).
pub fn is_connection_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

fn report_connection_error(err: &sqlx::Error) {
    if is_connection_error(err) {
        tracing::error!(error = %err, "Database connection error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_level_failures_are_connection_errors() {
        assert!(is_connection_error(&sqlx::Error::PoolTimedOut));
        assert!(is_connection_error(&sqlx::Error::PoolClosed));
        assert!(is_connection_error(&sqlx::Error::Io(std::io::Error::other(
            "reset"
        ))));
    }

    #[test]
    fn statement_failures_are_not_connection_errors() {
        assert!(!is_connection_error(&sqlx::Error::RowNotFound));
        assert!(!is_connection_error(&sqlx::Error::ColumnNotFound(
            "id".into()
        )));
    }

    #[test]
    fn settings_defaults() {
        let settings = DbSettings::new("postgres://localhost/crm");
        assert_eq!(settings.max_connections, 20);
        assert_eq!(settings.acquire_timeout, Duration::from_secs(5));
    }
}
