//! Test helpers: an isolated PostgreSQL container plus the repositories.
//!
//! Run from workspace root: `cargo test -p videoteca-db`. Docker must be
//! available. Migrations are embedded from the workspace `migrations/`.

#![allow(dead_code)]

pub mod fixtures;

use sqlx::PgPool;
use std::sync::Arc;
use tempfile::TempDir;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;
use videoteca_core::Config;
use videoteca_db::{
    setup_database, TagRepository, UserRepository, VideoMediaRepository, VideoRepository,
};
use videoteca_storage::{LocalStorage, Storage};

pub const TEST_DB_PASSWORD: &str = "postgres";

/// Test database with repositories and owned resources
pub struct TestDb {
    pub pool: PgPool,
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub tags: TagRepository,
    pub users: UserRepository,
    pub videos: VideoRepository,
    pub media: VideoMediaRepository,
    pub _container: ContainerAsync<Postgres>,
    pub _temp_dir: TempDir,
}

impl TestDb {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Whether a table exists in the public schema
    pub async fn table_exists(&self, table: &str) -> bool {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM information_schema.tables WHERE table_schema = 'public' AND table_name = $1)",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to query information_schema")
    }
}

/// Configuration pointing at the container on `port`
pub fn test_config(port: u16, password: &str, media_root: &str) -> Config {
    let password = password.to_string();
    let media_root = media_root.to_string();
    Config::from_lookup(move |key: &str| {
        let value = match key {
            "POSTGRES_HOST" => "127.0.0.1".to_string(),
            "POSTGRES_PORT" => port.to_string(),
            "POSTGRES_USER" => "postgres".to_string(),
            "POSTGRES_PASSWORD" => password.clone(),
            "POSTGRES_DB" => "postgres".to_string(),
            "PGADMIN_DEFAULT_EMAIL" => "admin@videoteca.test".to_string(),
            "PGADMIN_DEFAULT_PASSWORD" => "admin".to_string(),
            "DB_TIMEOUT_SECONDS" => "10".to_string(),
            "MEDIA_ROOT" => media_root.clone(),
            "MEDIA_URL" => "http://localhost:8000/media".to_string(),
            _ => return None,
        };
        Some(value)
    })
    .expect("Failed to build test config")
}

/// Start PostgreSQL, apply migrations and build the repositories
pub async fn setup_test_db() -> TestDb {
    let container = Postgres::default()
        .start()
        .await
        .expect("Failed to start PostgreSQL container");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get PostgreSQL port");

    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = test_config(
        port,
        TEST_DB_PASSWORD,
        &temp_dir.path().join("media").to_string_lossy(),
    );

    let pool = setup_database(&config)
        .await
        .expect("Failed to set up test database");

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(&config.media.root, config.media.base_url.clone())
            .await
            .expect("Failed to create local storage"),
    );

    TestDb {
        tags: TagRepository::new(pool.clone()),
        users: UserRepository::new(pool.clone()),
        videos: VideoRepository::new(pool.clone(), storage.clone()),
        media: VideoMediaRepository::new(pool.clone()),
        pool,
        config,
        storage,
        _container: container,
        _temp_dir: temp_dir,
    }
}
