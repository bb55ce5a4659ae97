use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Open the catalog database named by `DATABASE_URL` and bring its schema up to date.
pub async fn init() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
        Ok(value) => value
            .parse::<u32>()
            .ok()
            .filter(|max| *max > 0)
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
        Err(_) => DEFAULT_MAX_CONNECTIONS,
    };

    connect(&database_url, max_connections).await
}

/// Connect to a catalog database, creating the file if needed, and run migrations.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid catalog database url: {database_url}"))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open catalog database at {database_url}"))?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to migrate catalog database")?;

    Ok(pool)
}
