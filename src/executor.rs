//! Plan Executor: runs a plan's actions in order against the fact base.
//!
//! Each successful action writes `effects ∪ discovered facts` (discovered wins) to the fact
//! store. The first failing action stops the run; nothing it declared is written and earlier
//! writes are not rolled back.

use crate::error::InvokeError;
use crate::invoker::ActionInvoker;
use crate::store::FactStore;
use crate::types::{Action, FactMap, Plan};
use std::sync::Arc;
use tracing::{info, warn};

/// The action that stopped a plan run.
#[derive(Debug)]
pub struct ActionFailure {
    /// Zero-based position in `plan.steps`.
    pub index: usize,
    pub action: Action,
    pub error: InvokeError,
}

/// Outcome of one plan run.
#[derive(Debug)]
pub struct ExecutionReport {
    pub goal_name: String,
    pub total_steps: usize,
    pub completed_steps: usize,
    pub failure: Option<ActionFailure>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failed_action(&self) -> Option<&Action> {
        self.failure.as_ref().map(|f| &f.action)
    }
}

/// Combine declared effects with discovered facts. Discovered facts win on key collision.
pub fn merge_effects(effects: &FactMap, discovered: FactMap) -> FactMap {
    let mut merged = effects.clone();
    merged.extend(discovered);
    merged
}

pub struct PlanExecutor {
    invoker: Arc<dyn ActionInvoker>,
    facts: Arc<dyn FactStore>,
    failure_fact: Option<String>,
}

impl PlanExecutor {
    pub fn new(invoker: Arc<dyn ActionInvoker>, facts: Arc<dyn FactStore>) -> Self {
        Self {
            invoker,
            facts,
            failure_fact: None,
        }
    }

    /// Record `<predicate> = "true"` in the fact base whenever a plan fails.
    pub fn with_failure_fact(mut self, predicate: Option<String>) -> Self {
        self.failure_fact = predicate;
        self
    }

    pub async fn execute(&self, plan: &Plan) -> ExecutionReport {
        let goal_name = plan.target_goal.name.clone();
        info!(
            goal = %goal_name,
            steps = plan.steps.len(),
            total_cost = plan.total_cost,
            "Starting plan execution"
        );

        let mut report = ExecutionReport {
            goal_name,
            total_steps: plan.steps.len(),
            completed_steps: 0,
            failure: None,
        };

        for (index, action) in plan.steps.iter().enumerate() {
            match self.invoker.invoke(action).await {
                Ok(discovered) => {
                    info!(goal = %report.goal_name, action = %action.name, "Action succeeded");
                    let merged = merge_effects(&action.effects, discovered);
                    self.apply_effects(action, &merged).await;
                    report.completed_steps += 1;
                }
                Err(error) => {
                    warn!(
                        goal = %report.goal_name,
                        action = %action.name,
                        step = index,
                        error = %error,
                        "Action failed, aborting plan"
                    );
                    self.record_failure().await;
                    report.failure = Some(ActionFailure {
                        index,
                        action: action.clone(),
                        error,
                    });
                    return report;
                }
            }
        }

        info!(goal = %report.goal_name, "Plan completed");
        report
    }

    async fn apply_effects(&self, action: &Action, merged: &FactMap) {
        for (predicate, value) in merged {
            match self.facts.write_value(predicate, value).await {
                Ok(()) => info!(action = %action.name, predicate = %predicate, value = %value, "Fact updated"),
                Err(e) => warn!(
                    action = %action.name,
                    predicate = %predicate,
                    error = %e,
                    "Failed to update fact"
                ),
            }
        }
    }

    async fn record_failure(&self) {
        if let Some(predicate) = &self.failure_fact {
            if let Err(e) = self.facts.write(predicate, "true").await {
                warn!(predicate = %predicate, error = %e, "Failed to record plan failure fact");
            }
        }
    }
}
