//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::parse::{Commands, ConfigCommands, FactsCommands};
use crate::cli::presentation::{
    format_facts_json, format_facts_text, format_goal_report_json, format_goal_report_text,
    format_outcome_json, format_outcome_text,
};
use crate::composition::{build_engine, open_fact_store, plan_queue, replan_sink};
use crate::config::{ConfigLoader, EngineConfig};
use crate::error::{DecodeError, EngineError};
use crate::goal::GoalEvaluator;
use crate::intake::{decode_plan, IntakeLoop};
use crate::types::{Goal, Plan};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{info, warn};

/// Runtime context for CLI execution: effective config and the async runtime.
pub struct RunContext {
    config: EngineConfig,
    runtime: Runtime,
}

impl RunContext {
    /// Load and validate config from the workspace layers or one explicit file.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, EngineError> {
        let config = ConfigLoader::resolve(config_path.as_deref(), &workspace_root)?;
        Self::from_config(config)
    }

    pub fn from_config(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            EngineError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        let runtime = Runtime::new()
            .map_err(|e| EngineError::Runtime(format!("Failed to start async runtime: {}", e)))?;
        Ok(Self { config, runtime })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, EngineError> {
        match command {
            Commands::Run => self.handle_run(),
            Commands::Execute { plan, format } => self.handle_execute(plan, format),
            Commands::Check { goal, format } => self.handle_check(goal, format),
            Commands::Facts { command } => self.handle_facts_command(command),
            Commands::Dispatch { plan } => self.handle_dispatch(plan),
            Commands::Config { command } => self.handle_config_command(command),
        }
    }

    fn handle_run(&self) -> Result<String, EngineError> {
        self.runtime.block_on(async {
            let facts = open_fact_store(&self.config.fact_store)?;
            let sink = Arc::new(replan_sink(&self.config.transport)?);
            let engine = Arc::new(build_engine(&self.config, facts, sink)?);
            let source = plan_queue(&self.config.transport)?;
            if self.config.transport.recover_in_flight {
                source.recover_in_flight().await?;
            }
            info!(queue = %source.plans_queue(), "Waiting for plans");

            let intake = IntakeLoop::new(Arc::new(source), engine);
            let stats = intake
                .run(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!(error = %e, "Failed to listen for Ctrl-C");
                        std::future::pending::<()>().await;
                    }
                })
                .await;
            Ok::<_, EngineError>(format!(
                "Processed {} plan(s): {} achieved, {} replanned, {} rejected",
                stats.received, stats.achieved, stats.replanned, stats.rejected
            ))
        })
    }

    fn handle_execute(&self, plan_path: &Path, format: &str) -> Result<String, EngineError> {
        let plan = read_plan(plan_path)?;
        let outcome = self.runtime.block_on(async {
            let facts = open_fact_store(&self.config.fact_store)?;
            let sink = Arc::new(replan_sink(&self.config.transport)?);
            let engine = build_engine(&self.config, facts, sink)?;
            Ok::<_, EngineError>(engine.handle_plan(&plan).await)
        })?;
        if format == "json" {
            Ok(format_outcome_json(&plan, &outcome))
        } else {
            Ok(format_outcome_text(&plan, &outcome))
        }
    }

    fn handle_check(&self, goal_path: &Path, format: &str) -> Result<String, EngineError> {
        let goal: Goal = read_json(goal_path)?;
        let report = self.runtime.block_on(async {
            let facts = open_fact_store(&self.config.fact_store)?;
            Ok::<_, EngineError>(GoalEvaluator::new(facts).report(&goal).await?)
        })?;
        if format == "json" {
            Ok(format_goal_report_json(&report))
        } else {
            Ok(format_goal_report_text(&goal, &report))
        }
    }

    fn handle_facts_command(&self, command: &FactsCommands) -> Result<String, EngineError> {
        match command {
            FactsCommands::List { format } => {
                let snapshot = self.runtime.block_on(async {
                    let facts = open_fact_store(&self.config.fact_store)?;
                    Ok::<_, EngineError>(facts.read_all().await?)
                })?;
                if format == "json" {
                    Ok(format_facts_json(&snapshot))
                } else {
                    Ok(format_facts_text(&snapshot))
                }
            }
            FactsCommands::Set { predicate, value } => {
                if predicate.trim().is_empty() {
                    return Err(EngineError::ConfigError(
                        "Predicate name cannot be empty".to_string(),
                    ));
                }
                self.runtime.block_on(async {
                    let facts = open_fact_store(&self.config.fact_store)?;
                    facts.write(predicate, value).await?;
                    Ok::<_, EngineError>(())
                })?;
                Ok(format!("Set {} = {}", predicate, value))
            }
        }
    }

    fn handle_dispatch(&self, plan_path: &Path) -> Result<String, EngineError> {
        let plan = read_plan(plan_path)?;
        self.runtime.block_on(async {
            let queue = plan_queue(&self.config.transport)?;
            queue.dispatch(&plan).await?;
            Ok::<_, EngineError>(())
        })?;
        Ok(format!(
            "Dispatched plan for goal '{}' ({} step(s)) to {}",
            plan.target_goal.name,
            plan.steps.len(),
            self.config.transport.plans_queue
        ))
    }

    fn handle_config_command(&self, command: &ConfigCommands) -> Result<String, EngineError> {
        match command {
            ConfigCommands::Show => self
                .config
                .to_toml()
                .map_err(|e| EngineError::ConfigError(format!("Failed to render config: {}", e))),
        }
    }
}

fn read_plan(path: &Path) -> Result<Plan, EngineError> {
    let bytes = std::fs::read(path)?;
    Ok(decode_plan(&bytes)?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, EngineError> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| EngineError::Decode(DecodeError(e)))
}
