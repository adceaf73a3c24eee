//! Run context built from config files: validation, sled-backed fact commands, config show.

use aoe_executor::cli::{Commands, ConfigCommands, FactsCommands, RunContext};
use aoe_executor::config::{ConfigLoader, EngineConfig, FactStoreBackend};
use aoe_executor::error::EngineError;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_sled_config(dir: &Path) -> PathBuf {
    let file = dir.join("engine.toml");
    fs::write(
        &file,
        format!(
            r#"
[fact_store]
backend = "sled"
sled_path = "{}"
hash_key = "test-facts"

[transport]
redis_url = "redis://127.0.0.1:1"
"#,
            dir.join("facts").display()
        ),
    )
    .unwrap();
    file
}

#[test]
fn test_load_from_file_applies_sections() {
    let temp = TempDir::new().unwrap();
    let file = write_sled_config(temp.path());

    let config = ConfigLoader::load_from_file(&file).unwrap();
    assert_eq!(config.fact_store.backend, FactStoreBackend::Sled);
    assert_eq!(config.fact_store.hash_key, "test-facts");
    assert_eq!(config.transport.redis_url, "redis://127.0.0.1:1");
    assert_eq!(config.transport.plans_queue, "aoe:plans");
    assert_eq!(config.executor.http_timeout_secs, 10);
}

#[test]
fn test_invalid_config_is_rejected_with_every_problem() {
    let mut config = EngineConfig::default();
    config.transport.replan_queue = config.transport.plans_queue.clone();
    config.executor.http_timeout_secs = 0;

    match RunContext::from_config(config) {
        Err(EngineError::ConfigError(msg)) => {
            assert!(msg.contains("plans_queue and replan_queue must differ"));
            assert!(msg.contains("http_timeout_secs"));
        }
        Err(other) => panic!("expected config error, got {}", other),
        Ok(_) => panic!("expected config error"),
    }
}

#[test]
fn test_facts_set_then_list_persists_in_sled() {
    let temp = TempDir::new().unwrap();
    let file = write_sled_config(temp.path());
    let ctx = RunContext::new(temp.path().to_path_buf(), Some(file)).unwrap();

    let out = ctx
        .execute(&Commands::Facts {
            command: FactsCommands::Set {
                predicate: "service_web_healthy".to_string(),
                value: "true".to_string(),
            },
        })
        .unwrap();
    assert!(out.contains("service_web_healthy"));

    let out = ctx
        .execute(&Commands::Facts {
            command: FactsCommands::List {
                format: "json".to_string(),
            },
        })
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["facts"]["service_web_healthy"], "true");
    assert_eq!(value["total"], 1);
}

#[test]
fn test_check_reports_mismatch_from_goal_file() {
    let temp = TempDir::new().unwrap();
    let file = write_sled_config(temp.path());
    let ctx = RunContext::new(temp.path().to_path_buf(), Some(file)).unwrap();

    ctx.execute(&Commands::Facts {
        command: FactsCommands::Set {
            predicate: "service_web_healthy".to_string(),
            value: "false".to_string(),
        },
    })
    .unwrap();

    let goal_file = temp.path().join("goal.json");
    fs::write(
        &goal_file,
        r#"{"name": "web-up", "desiredState": {"service_web_healthy": true, "port_open": true}}"#,
    )
    .unwrap();

    let out = ctx
        .execute(&Commands::Check {
            goal: goal_file,
            format: "json".to_string(),
        })
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["satisfied"], false);
    assert_eq!(value["checked"], 2);
    assert_eq!(value["mismatches"].as_array().unwrap().len(), 2);
}

#[test]
fn test_execute_with_malformed_plan_file_fails() {
    let temp = TempDir::new().unwrap();
    let file = write_sled_config(temp.path());
    let ctx = RunContext::new(temp.path().to_path_buf(), Some(file)).unwrap();

    let plan_file = temp.path().join("plan.json");
    fs::write(&plan_file, "not json").unwrap();
    let err = ctx
        .execute(&Commands::Execute {
            plan: plan_file,
            format: "text".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::Decode(_)));
}

#[test]
fn test_config_show_renders_effective_toml() {
    let temp = TempDir::new().unwrap();
    let file = write_sled_config(temp.path());
    let ctx = RunContext::new(temp.path().to_path_buf(), Some(file)).unwrap();

    let out = ctx
        .execute(&Commands::Config {
            command: ConfigCommands::Show,
        })
        .unwrap();
    let rendered: EngineConfig = toml::from_str(&out).unwrap();
    assert_eq!(rendered, *ctx.config());
    assert!(out.contains("backend = \"sled\""));
}
