//! Database maintenance commands.
//!
//! These only need `DATABASE_URL`, so they skip the full application config
//! and its provider credentials.

use brandvis_db::{DbError, PoolConfig};

async fn connect() -> anyhow::Result<sqlx::PgPool> {
    let url = std::env::var("DATABASE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(DbError::MissingDatabaseUrl)?;
    Ok(brandvis_db::connect_pool(&url, PoolConfig::default()).await?)
}

/// # Errors
///
/// Returns an error if `DATABASE_URL` is unset or the server does not answer.
pub(crate) async fn run_db_ping() -> anyhow::Result<()> {
    let pool = connect().await?;
    brandvis_db::ping(&pool).await?;
    println!("database: ok");
    Ok(())
}

/// # Errors
///
/// Returns an error if `DATABASE_URL` is unset or a migration fails.
pub(crate) async fn run_db_migrate() -> anyhow::Result<()> {
    let pool = connect().await?;
    let applied = brandvis_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations complete");
    println!("applied {applied} migration(s)");
    Ok(())
}
