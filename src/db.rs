use crate::config::DatabaseConfig;
use crate::error::AppError;
use log::info;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

/// DDL for the tables `PgRepository` reads and writes. Idempotent.
pub const SCHEMA: &str = include_str!("../sql/schema.sql");

/// Opens a connection pool to the configured database.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    info!(
        "Connected to database (max {} connections)",
        config.max_connections
    );
    Ok(pool)
}

/// Creates the enum types, tables and indexes if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    pool.execute(SCHEMA).await?;
    Ok(())
}
