use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::query::QueryError;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Maps a unique-constraint violation to `Conflict`, leaving every
    /// other error untouched.
    pub fn on_unique_violation(err: sqlx::Error, message: impl Into<String>) -> Self {
        if matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation()) {
            DatabaseError::Conflict(message.into())
        } else {
            DatabaseError::Sqlx(err)
        }
    }
}

/// Builds the single application pool.
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config.url.as_deref().ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let pool = Self::pool_options(config).connect(url).await?;
        info!("Connected database pool (max_connections={})", config.max_connections);
        Ok(pool)
    }

    /// Pool that opens connections on first use. Lets the router start (and
    /// tests run) before the database is reachable.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config.url.as_deref().ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        Ok(Self::pool_options(config).connect_lazy(url)?)
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}
