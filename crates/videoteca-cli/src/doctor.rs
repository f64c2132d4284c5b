//! Environment diagnostics behind `videoteca doctor`
//!
//! Checks, in order: required environment variables, configuration, database
//! connectivity with the configured credentials, and (optionally) the
//! database and admin-panel containers.

use serde::Serialize;
use videoteca_core::{missing_required_env, Config};

use crate::health::{
    check_container_running, ContainerRuntime, PGADMIN_CONTAINER_PATTERN,
    POSTGRES_CONTAINER_PATTERN,
};

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            ok: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            ok: false,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DoctorReport {
    pub checks: Vec<CheckResult>,
}

impl DoctorReport {
    pub fn healthy(&self) -> bool {
        self.checks.iter().all(|c| c.ok)
    }

    fn record(&mut self, result: CheckResult) {
        if result.ok {
            tracing::info!(check = result.name, detail = %result.detail, "Check passed");
        } else {
            tracing::warn!(check = result.name, detail = %result.detail, "Check failed");
        }
        self.checks.push(result);
    }
}

/// Result of the environment-variable check for a given list of missing names
pub fn env_check(missing: &[&str]) -> CheckResult {
    if missing.is_empty() {
        CheckResult::pass("environment", "All required variables are set")
    } else {
        CheckResult::fail(
            "environment",
            format!("Missing required variables: {}", missing.join(", ")),
        )
    }
}

/// Run every check. Container checks are skipped when `runtime` is `None`.
pub async fn run(runtime: Option<&dyn ContainerRuntime>) -> DoctorReport {
    let mut report = DoctorReport::default();

    report.record(env_check(&missing_required_env()));

    match Config::from_env() {
        Ok(config) => {
            report.record(CheckResult::pass(
                "configuration",
                format!("environment={}", config.environment),
            ));
            report.record(database_check(&config).await);
        }
        Err(e) => report.record(CheckResult::fail("configuration", e.to_string())),
    }

    if let Some(runtime) = runtime {
        for (name, pattern) in [
            ("postgres_container", POSTGRES_CONTAINER_PATTERN),
            ("pgadmin_container", PGADMIN_CONTAINER_PATTERN),
        ] {
            let result = match check_container_running(runtime, pattern).await {
                Ok(container) => CheckResult::pass(name, format!("{} is running", container.names)),
                Err(e) => CheckResult::fail(name, e.to_string()),
            };
            report.record(result);
        }
    }

    report
}

async fn database_check(config: &Config) -> CheckResult {
    let pool = match videoteca_db::connect(config).await {
        Ok(pool) => pool,
        Err(e) => return CheckResult::fail("database", e.detailed_message()),
    };

    let result = match videoteca_db::ping(&pool).await {
        Ok(()) => CheckResult::pass(
            "database",
            format!(
                "Authenticated as {} on {}:{}/{}",
                config.database.user,
                config.database.host,
                config.database.port,
                config.database.name
            ),
        ),
        Err(e) => CheckResult::fail("database", e.detailed_message()),
    };
    pool.close().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_check() {
        assert!(env_check(&[]).ok);

        let result = env_check(&["POSTGRES_PASSWORD", "POSTGRES_DB"]);
        assert!(!result.ok);
        assert_eq!(
            result.detail,
            "Missing required variables: POSTGRES_PASSWORD, POSTGRES_DB"
        );
    }

    #[test]
    fn test_report_health() {
        let mut report = DoctorReport::default();
        assert!(report.healthy());

        report.record(CheckResult::pass("environment", "ok"));
        assert!(report.healthy());

        report.record(CheckResult::fail("database", "connection refused"));
        assert!(!report.healthy());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["checks"][1]["name"], "database");
        assert_eq!(json["checks"][1]["ok"], false);
    }
}
