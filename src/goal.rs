//! Goal Evaluator
//!
//! Compares a goal's desired state against one fact base snapshot. Comparison is on the
//! flattened string form (see [`fact_string`]): `true` and `"true"` both match a stored
//! `"true"`, and a numeric `1` never matches a stored `"true"`. An absent predicate never
//! matches, whatever the desired value.

use crate::error::StoreError;
use crate::store::{FactSnapshot, FactStore};
use crate::types::{fact_string, Goal};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// One desired predicate that the fact base does not satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub predicate: String,
    pub desired: String,
    /// `None` when the predicate is absent from the fact base.
    pub actual: Option<String>,
}

/// Per-predicate evaluation of a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalReport {
    pub goal_name: String,
    pub checked: usize,
    pub mismatches: Vec<Mismatch>,
}

impl GoalReport {
    pub fn is_satisfied(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Check every desired predicate against `snapshot`.
pub fn evaluate(goal: &Goal, snapshot: &FactSnapshot) -> GoalReport {
    let mismatches = goal
        .desired_state
        .iter()
        .filter_map(|(predicate, desired)| {
            let desired = fact_string(desired);
            match snapshot.get(predicate) {
                Some(actual) if *actual == desired => None,
                actual => Some(Mismatch {
                    predicate: predicate.clone(),
                    desired,
                    actual: actual.cloned(),
                }),
            }
        })
        .collect();

    GoalReport {
        goal_name: goal.name.clone(),
        checked: goal.desired_state.len(),
        mismatches,
    }
}

pub struct GoalEvaluator {
    facts: Arc<dyn FactStore>,
}

impl GoalEvaluator {
    pub fn new(facts: Arc<dyn FactStore>) -> Self {
        Self { facts }
    }

    /// Read the fact base once and evaluate `goal` against it.
    pub async fn report(&self, goal: &Goal) -> Result<GoalReport, StoreError> {
        let snapshot = self.facts.read_all().await?;
        let report = evaluate(goal, &snapshot);
        for mismatch in &report.mismatches {
            debug!(
                goal = %goal.name,
                predicate = %mismatch.predicate,
                desired = %mismatch.desired,
                actual = mismatch.actual.as_deref().unwrap_or("<absent>"),
                "Desired predicate not satisfied"
            );
        }
        Ok(report)
    }

    pub async fn is_satisfied(&self, goal: &Goal) -> Result<bool, StoreError> {
        Ok(self.report(goal).await?.is_satisfied())
    }
}
