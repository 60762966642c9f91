use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

use crate::config::DatabaseConfig;

/// Classified outcome of a repository operation. An empty result set is a
/// successful read; `Database` means the statement itself failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("a user with this email and login already exists")]
    Duplicate,

    #[error("referenced author does not exist")]
    AuthorMissing,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Connects eagerly: bad credentials or an unreachable host abort startup
/// here instead of failing on the first request.
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect_with(config.connect_options()?)
        .await
        .context("connect to database")?;
    Ok(pool)
}
