//! Configuration module
//!
//! Settings are read once from the environment (after loading `.env` with
//! `dotenvy`) into an explicit [`Config`] that is handed to the database and
//! file storage collaborators at start-up.

use std::env;
use std::fmt;

use crate::error::AppError;

// Common constants
const MAX_CONNECTIONS: u32 = 5;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const POSTGRES_PORT: u16 = 5432;

/// Environment variables that must be present and non-empty.
pub const REQUIRED_ENV_VARS: &[&str] = &[
    "POSTGRES_PASSWORD",
    "POSTGRES_DB",
    "PGADMIN_DEFAULT_EMAIL",
    "PGADMIN_DEFAULT_PASSWORD",
];

/// PostgreSQL connection settings
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub timeout_seconds: u64,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Default credentials of the database admin panel (pgAdmin)
#[derive(Clone)]
pub struct AdminConfig {
    pub default_email: String,
    pub default_password: String,
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("default_email", &self.default_email)
            .field("default_password", &"<redacted>")
            .finish()
    }
}

/// Where uploaded thumbnails live and how they are served
#[derive(Clone, Debug)]
pub struct MediaConfig {
    pub root: String,
    pub base_url: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub database: DatabaseConfig,
    pub admin: AdminConfig,
    pub media: MediaConfig,
    pub environment: String,
}

impl Config {
    /// Load `.env` (if present) and build the configuration from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// All missing required variables are reported in a single error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing = missing_required(&lookup);
        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let required = |key: &str| lookup(key).unwrap_or_default();
        let optional = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let port = match lookup("POSTGRES_PORT").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                AppError::Config(format!("POSTGRES_PORT must be a valid port, got '{}'", raw))
            })?,
            None => POSTGRES_PORT,
        };

        let database = DatabaseConfig {
            host: optional("POSTGRES_HOST", "localhost"),
            port,
            user: optional("POSTGRES_USER", "postgres"),
            password: required("POSTGRES_PASSWORD"),
            name: required("POSTGRES_DB"),
            max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            timeout_seconds: lookup("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
        };

        let config = Config {
            database,
            admin: AdminConfig {
                default_email: required("PGADMIN_DEFAULT_EMAIL"),
                default_password: required("PGADMIN_DEFAULT_PASSWORD"),
            },
            media: MediaConfig {
                root: optional("MEDIA_ROOT", "./media"),
                base_url: optional("MEDIA_URL", "/media"),
            },
            environment: lookup("ENVIRONMENT")
                .or_else(|| lookup("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.database.max_connections == 0 {
            return Err(AppError::Config(
                "DB_MAX_CONNECTIONS cannot be 0".to_string(),
            ));
        }

        if self.database.timeout_seconds == 0 {
            return Err(AppError::Config("DB_TIMEOUT_SECONDS cannot be 0".to_string()));
        }

        if !self.admin.default_email.contains('@') {
            return Err(AppError::Config(
                "PGADMIN_DEFAULT_EMAIL must be an email address".to_string(),
            ));
        }

        if self.is_production() && self.database.password.len() < 12 {
            tracing::warn!("POSTGRES_PASSWORD is shorter than 12 characters in production");
        }

        Ok(())
    }
}

/// Names of required variables that are unset or empty in the process environment.
pub fn missing_required_env() -> Vec<&'static str> {
    missing_required(&|key: &str| env::var(key).ok())
}

fn missing_required<F>(lookup: &F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    REQUIRED_ENV_VARS
        .iter()
        .copied()
        .filter(|key| lookup(*key).map_or(true, |v| v.trim().is_empty()))
        .collect()
}
