//! Async PostgreSQL connection pool (diesel-async + bb8).

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// Async connection pool. `bb8::Pool` is an `Arc` inside, so clones are cheap.
pub type AsyncDbPool = Pool<AsyncPgConnection>;

/// A connection checked out of [`AsyncDbPool`].
pub type DbConnection<'a> = PooledConnection<'a, AsyncPgConnection>;

/// Builds the pool from configuration and checks one connection out so a
/// bad URL fails at startup rather than on the first request.
pub async fn establish_async_connection_pool(config: &DatabaseConfig) -> AppResult<AsyncDbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.as_str());

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(Duration::from_secs(config.connection_timeout))
        .build(manager)
        .await
        .map_err(|e| AppError::ConnectionPool {
            source: anyhow::anyhow!("Failed to build connection pool: {e}"),
        })?;

    drop(pool.get().await?);
    Ok(pool)
}
