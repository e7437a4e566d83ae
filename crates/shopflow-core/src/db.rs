use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::config::DatabaseConfig;
use crate::error::Result;

pub type DbPool = Pool<Postgres>;

/// Establish a Postgres connection pool. The pipeline issues one statement at
/// a time, so a small pool is plenty.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool> {
    connect_url(&config.url()).await
}

pub async fn connect_url(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run database migrations embedded at compile-time. Creates the `staging`
/// and `warehouse` schemas and every table the loaders touch.
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
