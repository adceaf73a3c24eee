//! Execute -> evaluate -> replan for one decoded plan.

use crate::executor::PlanExecutor;
use crate::goal::GoalEvaluator;
use crate::replan::ReplanPublisher;
use crate::types::Plan;
use serde::Serialize;
use tracing::{error, info, warn};

/// Why a replan was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplanReason {
    /// An action failed and the plan was aborted.
    PlanFailed,
    /// Every action succeeded but the goal's desired state is not in the fact base.
    GoalUnsatisfied,
    /// Every action succeeded but the fact base could not be read to check the goal.
    GoalUnverifiable,
}

/// Final state of one dispatched plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Payload could not be decoded; nothing ran.
    Rejected,
    GoalAchieved,
    Replanned {
        reason: ReplanReason,
        /// Whether the replan request reached the outbound channel.
        published: bool,
    },
}

/// Decide whether a finished plan run needs a replan.
///
/// `goal_satisfied` is the goal check made after a successful run; `Err` means the fact
/// base could not be read. A successful run with no check counts as unsatisfied.
pub fn replan_reason<E>(
    plan_succeeded: bool,
    goal_satisfied: Option<&Result<bool, E>>,
) -> Option<ReplanReason> {
    if !plan_succeeded {
        return Some(ReplanReason::PlanFailed);
    }
    match goal_satisfied {
        Some(Ok(true)) => None,
        Some(Ok(false)) | None => Some(ReplanReason::GoalUnsatisfied),
        Some(Err(_)) => Some(ReplanReason::GoalUnverifiable),
    }
}

pub struct Engine {
    executor: PlanExecutor,
    evaluator: GoalEvaluator,
    publisher: ReplanPublisher,
}

impl Engine {
    pub fn new(executor: PlanExecutor, evaluator: GoalEvaluator, publisher: ReplanPublisher) -> Self {
        Self {
            executor,
            evaluator,
            publisher,
        }
    }

    pub async fn handle_plan(&self, plan: &Plan) -> DispatchOutcome {
        let goal = &plan.target_goal;
        let report = self.executor.execute(plan).await;

        let evaluation = if report.is_success() {
            let evaluation = self.evaluator.is_satisfied(goal).await;
            if let Err(e) = &evaluation {
                error!(goal = %goal.name, error = %e, "Failed to check goal state");
            }
            Some(evaluation)
        } else {
            if let Some(failure) = &report.failure {
                warn!(
                    goal = %goal.name,
                    action = %failure.action.name,
                    completed = report.completed_steps,
                    total = report.total_steps,
                    error = %failure.error,
                    "Plan execution interrupted by failure"
                );
            }
            None
        };

        let reason = replan_reason(report.is_success(), evaluation.as_ref());

        match reason {
            None => {
                info!(goal = %goal.name, "Goal achieved");
                DispatchOutcome::GoalAchieved
            }
            Some(reason) => {
                warn!(goal = %goal.name, reason = ?reason, "Goal not achieved, requesting replan");
                let published = self.publisher.request_replan(goal).await;
                DispatchOutcome::Replanned { reason, published }
            }
        }
    }
}
