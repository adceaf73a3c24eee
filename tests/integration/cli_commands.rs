//! End-to-end tests of the aoe-executor binary with a sled fact store.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

use crate::integration::test_utils::MockExecutorService;

struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join("config");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.toml"),
            format!(
                r#"
[fact_store]
backend = "sled"
sled_path = "{}"

[transport]
redis_url = "redis://127.0.0.1:1"
"#,
                temp.path().join("facts").display()
            ),
        )
        .unwrap();
        Self { temp }
    }

    fn path(&self) -> &Path {
        self.temp.path()
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        let bin = env!("CARGO_BIN_EXE_aoe-executor");
        Command::new(bin)
            .env("XDG_CONFIG_HOME", self.temp.path().join("xdg"))
            .env("HOME", self.temp.path())
            .env_remove("AOE_ENV")
            .env_remove("AOE_LOG")
            .arg("--workspace")
            .arg(self.temp.path())
            .arg("--quiet")
            .args(args)
            .output()
            .unwrap()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_facts_set_and_list() {
    let ws = Workspace::new();

    let output = ws.run(&["facts", "set", "service_web_healthy", "true"]);
    assert!(output.status.success(), "stderr={}", stderr(&output));

    let output = ws.run(&["facts", "list", "--format", "json"]);
    assert!(output.status.success(), "stderr={}", stderr(&output));
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["facts"]["service_web_healthy"], "true");

    let output = ws.run(&["facts", "list"]);
    assert!(stdout(&output).contains("service_web_healthy"));
}

#[test]
fn test_check_exit_status_is_success_even_when_unsatisfied() {
    let ws = Workspace::new();
    let goal = ws.write(
        "goal.json",
        r#"{"name": "web-up", "desiredState": {"service_web_healthy": true}}"#,
    );

    let output = ws.run(&["check", "--goal", goal.to_str().unwrap(), "--format", "json"]);
    assert!(output.status.success(), "stderr={}", stderr(&output));
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["satisfied"], false);
    assert_eq!(value["mismatches"][0]["actual"], serde_json::Value::Null);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_execute_plan_file_updates_fact_base() {
    let service = MockExecutorService::start().await;
    let ws = Workspace::new();
    let plan = ws.write(
        "plan.json",
        &format!(
            r#"{{
                "targetGoal": {{"name": "web-up", "desiredState": {{"service_web_healthy": true}}}},
                "steps": [{{
                    "name": "restart_web",
                    "cost": 2,
                    "executor": {{"type": "http", "method": "POST", "url": "{}"}}
                }}]
            }}"#,
            service.url("/restart/web")
        ),
    );

    let plan_arg = plan.to_str().unwrap().to_string();
    let output = tokio::task::spawn_blocking({
        let ws_path = ws.path().to_path_buf();
        move || {
            Command::new(env!("CARGO_BIN_EXE_aoe-executor"))
                .env("XDG_CONFIG_HOME", ws_path.join("xdg"))
                .env("HOME", &ws_path)
                .env_remove("AOE_ENV")
                .arg("--workspace")
                .arg(&ws_path)
                .arg("--quiet")
                .args(["execute", "--plan", &plan_arg, "--format", "json"])
                .output()
                .unwrap()
        }
    })
    .await
    .unwrap();

    assert!(output.status.success(), "stderr={}", stderr(&output));
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["result"]["outcome"], "goal_achieved");
    assert_eq!(service.paths(), vec!["/restart/web".to_string()]);

    let output = ws.run(&["facts", "list", "--format", "json"]);
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["facts"]["service_web_healthy"], "true");
}

#[test]
fn test_execute_failing_plan_reports_unpublished_replan() {
    let ws = Workspace::new();
    let plan = ws.write(
        "plan.json",
        r#"{
            "targetGoal": {"name": "web-up"},
            "steps": [{"name": "restart", "executor": {"type": "ssh"}}]
        }"#,
    );

    let output = ws.run(&["execute", "--plan", plan.to_str().unwrap(), "--format", "json"]);
    assert!(output.status.success(), "stderr={}", stderr(&output));
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["result"]["outcome"], "replanned");
    assert_eq!(value["result"]["reason"], "plan_failed");
    assert_eq!(value["result"]["published"], false);
}

#[test]
fn test_dispatch_rejects_malformed_plan_before_connecting() {
    let ws = Workspace::new();
    let plan = ws.write("plan.json", r#"{"steps": []}"#);

    let output = ws.run(&["dispatch", "--plan", plan.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid input file"));
}

#[test]
fn test_invalid_config_exits_nonzero() {
    let ws = Workspace::new();
    let bad = ws.write("bad.toml", "[executor]\nhttp_timeout_secs = 0\n");

    let output = ws.run(&["--config", bad.to_str().unwrap(), "config", "show"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("http_timeout_secs"));
}

#[test]
fn test_config_show_reflects_workspace_file() {
    let ws = Workspace::new();
    let output = ws.run(&["config", "show"]);
    assert!(output.status.success(), "stderr={}", stderr(&output));
    assert!(stdout(&output).contains("backend = \"sled\""));
}
