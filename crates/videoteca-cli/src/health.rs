//! Container health probe
//!
//! Finds the database and admin-panel containers by name and checks that
//! they are running. The container runtime is a trait so the matching logic
//! can be tested without Docker.

use async_trait::async_trait;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;

/// Name pattern of the PostgreSQL container
pub const POSTGRES_CONTAINER_PATTERN: &str = r"(postgres|\.?videoteca-db-1)";

/// Name pattern of the pgAdmin container
pub const PGADMIN_CONTAINER_PATTERN: &str = r"(pgadmin|\.?videoteca-pgadmin-1)";

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("No container matches {0}")]
    NotFound(String),

    #[error("Container {name} is {state}, not running")]
    NotRunning { name: String, state: String },

    #[error("Invalid container pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Container runtime error: {0}")]
    Runtime(String),
}

/// One container as reported by the runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Names")]
    pub names: String,
    #[serde(rename = "Image", default)]
    pub image: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Status", default)]
    pub status: String,
}

impl ContainerSummary {
    pub fn is_running(&self) -> bool {
        self.state.eq_ignore_ascii_case("running")
    }

    /// Container names; the runtime reports several as a comma-separated list
    pub fn name_list(&self) -> impl Iterator<Item = &str> {
        self.names.split(',').map(str::trim).filter(|n| !n.is_empty())
    }
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// All containers, running or not
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, HealthError>;
}

/// Runtime backed by the `docker` command line
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
        }
    }
}

impl DockerCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// Parse `docker ps --format '{{json .}}'` output, one JSON object per line
pub fn parse_ps_output(output: &str) -> Result<Vec<ContainerSummary>, HealthError> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str::<ContainerSummary>(line)
                .map_err(|e| HealthError::Runtime(format!("Unparseable container entry: {}", e)))
        })
        .collect()
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, HealthError> {
        let output = Command::new(&self.program)
            .args(["ps", "-a", "--format", "{{json .}}"])
            .output()
            .await
            .map_err(|e| HealthError::Runtime(format!("Failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(HealthError::Runtime(format!(
                "{} ps exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let containers = parse_ps_output(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!(count = containers.len(), "Listed containers");
        Ok(containers)
    }
}

/// Find a container whose name matches `pattern` (case-insensitive) and
/// check that it is running. A running match wins over stopped ones.
pub async fn check_container_running(
    runtime: &dyn ContainerRuntime,
    pattern: &str,
) -> Result<ContainerSummary, HealthError> {
    let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;

    let matching: Vec<ContainerSummary> = runtime
        .list_containers()
        .await?
        .into_iter()
        .filter(|c| c.name_list().any(|name| regex.is_match(name)))
        .collect();

    if let Some(running) = matching.iter().find(|c| c.is_running()) {
        return Ok(running.clone());
    }

    match matching.into_iter().next() {
        Some(stopped) => Err(HealthError::NotRunning {
            name: stopped.names,
            state: stopped.state,
        }),
        None => Err(HealthError::NotFound(pattern.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeRuntime(Vec<ContainerSummary>);

    #[async_trait]
    impl ContainerRuntime for FakeRuntime {
        async fn list_containers(&self) -> Result<Vec<ContainerSummary>, HealthError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenRuntime;

    #[async_trait]
    impl ContainerRuntime for BrokenRuntime {
        async fn list_containers(&self) -> Result<Vec<ContainerSummary>, HealthError> {
            Err(HealthError::Runtime("daemon not reachable".to_string()))
        }
    }

    fn container(names: &str, state: &str) -> ContainerSummary {
        ContainerSummary {
            id: format!("id-{}", names),
            names: names.to_string(),
            image: "image".to_string(),
            state: state.to_string(),
            status: String::new(),
        }
    }

    #[tokio::test]
    async fn test_finds_running_postgres_container() {
        let runtime = FakeRuntime(vec![
            container("videoteca-web-1", "running"),
            container("videoteca-db-1", "running"),
        ]);

        let found = check_container_running(&runtime, POSTGRES_CONTAINER_PATTERN)
            .await
            .unwrap();
        assert_eq!(found.names, "videoteca-db-1");
    }

    #[tokio::test]
    async fn test_pattern_is_case_insensitive() {
        let runtime = FakeRuntime(vec![container("My-PgAdmin", "running")]);
        assert!(check_container_running(&runtime, PGADMIN_CONTAINER_PATTERN)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_running_match_wins_over_stopped_one() {
        let runtime = FakeRuntime(vec![
            container("old-postgres", "exited"),
            container("postgres", "running"),
        ]);
        let found = check_container_running(&runtime, POSTGRES_CONTAINER_PATTERN)
            .await
            .unwrap();
        assert_eq!(found.names, "postgres");
    }

    #[tokio::test]
    async fn test_stopped_container_is_reported() {
        let runtime = FakeRuntime(vec![container("videoteca-pgadmin-1", "exited")]);
        let err = check_container_running(&runtime, PGADMIN_CONTAINER_PATTERN)
            .await
            .unwrap_err();
        assert!(matches!(err, HealthError::NotRunning { ref state, .. } if state == "exited"));
    }

    #[tokio::test]
    async fn test_missing_container_is_not_found() {
        let runtime = FakeRuntime(vec![container("redis", "running")]);
        let err = check_container_running(&runtime, POSTGRES_CONTAINER_PATTERN)
            .await
            .unwrap_err();
        assert!(matches!(err, HealthError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_runtime_errors_propagate() {
        let err = check_container_running(&BrokenRuntime, POSTGRES_CONTAINER_PATTERN)
            .await
            .unwrap_err();
        assert!(matches!(err, HealthError::Runtime(_)));
    }

    #[test]
    fn test_parse_ps_output() {
        let output = r#"{"ID":"abc","Names":"videoteca-db-1","Image":"postgres:16","State":"running","Status":"Up 2 hours"}
{"ID":"def","Names":"videoteca-pgadmin-1,pgadmin","Image":"dpage/pgadmin4","State":"exited","Status":"Exited (0)"}
"#;
        let containers = parse_ps_output(output).unwrap();
        assert_eq!(containers.len(), 2);
        assert!(containers[0].is_running());
        assert_eq!(
            containers[1].name_list().collect::<Vec<_>>(),
            vec!["videoteca-pgadmin-1", "pgadmin"]
        );
        assert!(parse_ps_output("not json").is_err());
        assert!(parse_ps_output("").unwrap().is_empty());
    }
}
