//! Database setup and initialization

use anyhow::Context;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;
use videoteca_core::{AppError, Config};

/// Migrations from the workspace `migrations/` directory, embedded at compile time
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

fn connect_options(config: &Config) -> PgConnectOptions {
    let db = &config.database;
    PgConnectOptions::new()
        .host(&db.host)
        .port(db.port)
        .username(&db.user)
        .password(&db.password)
        .database(&db.name)
}

/// Open a connection pool for the configured database
pub async fn connect(config: &Config) -> Result<PgPool, AppError> {
    tracing::info!(
        host = %config.database.host,
        port = config.database.port,
        database = %config.database.name,
        "Connecting to database..."
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(connect_options(config))
        .await?;

    tracing::info!(
        max_connections = config.database.max_connections,
        "Database connected successfully"
    );

    Ok(pool)
}

/// Apply pending migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    MIGRATOR
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Connect and bring the schema up to date
pub async fn setup_database(config: &Config) -> Result<PgPool, AppError> {
    let pool = connect(config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Round-trip a trivial query to prove the connection works
pub async fn ping(pool: &PgPool) -> Result<(), AppError> {
    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    if one != 1 {
        return Err(AppError::Internal(format!(
            "Unexpected health check result: {}",
            one
        )));
    }
    Ok(())
}
