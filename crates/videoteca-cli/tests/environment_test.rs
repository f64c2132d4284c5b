//! Deployment environment checks.
//!
//! The `#[ignore]`d tests inspect the real machine (environment variables and
//! the docker containers) and are meant to be run explicitly on a deployed
//! host with `cargo test -- --ignored`.

use async_trait::async_trait;
use videoteca_cli::doctor::env_check;
use videoteca_cli::health::{
    check_container_running, parse_ps_output, ContainerRuntime, ContainerSummary, DockerCli,
    HealthError, PGADMIN_CONTAINER_PATTERN, POSTGRES_CONTAINER_PATTERN,
};
use videoteca_core::{missing_required_env, REQUIRED_ENV_VARS};

const COMPOSE_PS_OUTPUT: &str = r#"
{"ID":"a1b2c3","Names":"videoteca-db-1","Image":"postgres:16","State":"running","Status":"Up 2 hours"}
{"ID":"d4e5f6","Names":"videoteca-pgadmin-1","Image":"dpage/pgadmin4","State":"running","Status":"Up 2 hours"}
{"ID":"0a0b0c","Names":"videoteca-web-1","Image":"videoteca:latest","State":"exited","Status":"Exited (0) 3 hours ago"}
"#;

struct ScriptedRuntime {
    output: &'static str,
}

#[async_trait]
impl ContainerRuntime for ScriptedRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, HealthError> {
        parse_ps_output(self.output)
    }
}

#[tokio::test]
async fn test_compose_stack_is_recognised() {
    let runtime = ScriptedRuntime {
        output: COMPOSE_PS_OUTPUT,
    };

    let db = check_container_running(&runtime, POSTGRES_CONTAINER_PATTERN)
        .await
        .unwrap();
    assert_eq!(db.names, "videoteca-db-1");

    let admin = check_container_running(&runtime, PGADMIN_CONTAINER_PATTERN)
        .await
        .unwrap();
    assert_eq!(admin.names, "videoteca-pgadmin-1");
}

#[tokio::test]
async fn test_stopped_admin_panel_is_reported() {
    let runtime = ScriptedRuntime {
        output: r#"{"ID":"a1","Names":"videoteca-db-1","State":"running"}
{"ID":"b2","Names":"videoteca-pgadmin-1","State":"exited"}"#,
    };

    let err = check_container_running(&runtime, PGADMIN_CONTAINER_PATTERN)
        .await
        .unwrap_err();
    match err {
        HealthError::NotRunning { name, state } => {
            assert_eq!(name, "videoteca-pgadmin-1");
            assert_eq!(state, "exited");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_runtime_reports_missing_database() {
    let runtime = ScriptedRuntime { output: "" };
    let err = check_container_running(&runtime, POSTGRES_CONTAINER_PATTERN)
        .await
        .unwrap_err();
    assert!(matches!(err, HealthError::NotFound(_)));
}

#[test]
fn test_env_check_names_every_required_variable() {
    let result = env_check(REQUIRED_ENV_VARS);
    assert!(!result.ok);
    for key in REQUIRED_ENV_VARS {
        assert!(result.detail.contains(key), "{} not reported", key);
    }
}

#[test]
#[ignore = "inspects the deployment environment"]
fn test_required_environment_variables_are_set() {
    dotenvy::dotenv().ok();
    let missing = missing_required_env();
    assert!(
        missing.is_empty(),
        "Missing required variables: {}",
        missing.join(", ")
    );
}

#[tokio::test]
#[ignore = "requires docker and the running compose stack"]
async fn test_postgres_container_is_running() {
    let docker = DockerCli::default();
    let container = check_container_running(&docker, POSTGRES_CONTAINER_PATTERN)
        .await
        .unwrap();
    assert!(container.is_running());
}

#[tokio::test]
#[ignore = "requires docker and the running compose stack"]
async fn test_pgadmin_container_is_running() {
    let docker = DockerCli::default();
    let container = check_container_running(&docker, PGADMIN_CONTAINER_PATTERN)
        .await
        .unwrap();
    assert!(container.is_running());
}
