//! PostgreSQL persistence for validated regulations.
//!
//! Connection lifecycle ([`connect`]), idempotent schema setup
//! ([`ensure_schema`]), row models, repositories, and the deduplicating
//! batch loader ([`loader::upsert_batch`]).

use sqlx::postgres::PgPoolOptions;

pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod repositories;

pub use config::DbConfig;
pub use error::StoreError;

pub type DbPool = sqlx::PgPool;

/// Open a connection pool.
///
/// The pool is owned by the caller and passed to every operation; dropping
/// it (or calling [`sqlx::Pool::close`]) releases all connections.
pub async fn connect(config: &DbConfig) -> Result<DbPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(config.options.clone())
        .await
        .map_err(StoreError::Connection)
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), StoreError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(StoreError::classify)?;
    Ok(())
}

/// Create tables, indexes, and the component seed if absent.
///
/// Safe to call on every startup: applied migrations are tracked, and the
/// statements themselves tolerate pre-existing objects.
pub async fn ensure_schema(pool: &DbPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::debug!("Regulation schema ensured");
    Ok(())
}
