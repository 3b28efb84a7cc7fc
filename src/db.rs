use anyhow::{Context, Result};
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};
use std::{path::Path, str::FromStr};

/// Timestamp layout used for every stored date. Always UTC; sorts lexically.
pub const DB_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub async fn init_pool(db_path: &Path) -> Result<SqlitePool> {
    let url = format!("sqlite:{}", db_path.display());
    let opts = SqliteConnectOptions::from_str(&url)
        .context("Invalid DB path")?
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(opts)
        .await
        .context("Failed to open SQLite database")?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// A private in-memory database. Limited to one connection because every
/// SQLite `:memory:` connection is its own database.
#[cfg(test)]
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .context("Failed to open in-memory database")?;

    init_schema(&pool).await?;

    Ok(pool)
}

async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS snippets (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            title   TEXT    NOT NULL,
            content TEXT    NOT NULL,
            created TEXT    NOT NULL,
            expires TEXT    NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create snippets table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_snippets_created ON snippets(created)")
        .execute(pool)
        .await
        .context("Failed to create snippets index")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT    NOT NULL,
            email           TEXT    NOT NULL,
            hashed_password TEXT    NOT NULL,
            created         TEXT    NOT NULL,
            CONSTRAINT users_uc_email UNIQUE (email)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    Ok(())
}
