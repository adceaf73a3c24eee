//! Command-line executor kind.

use crate::error::InvokeError;
use crate::types::{Action, FactMap};
use tracing::info;

/// Placeholder for process-execution actions: always succeeds with no discovered facts.
#[derive(Debug, Default, Clone, Copy)]
pub struct CliExecutor;

impl CliExecutor {
    pub async fn execute(&self, action: &Action) -> Result<FactMap, InvokeError> {
        // TODO: run the command described by the action once the planner emits a command field.
        info!(action = %action.name, "CLI executor not implemented, treating action as succeeded");
        Ok(FactMap::new())
    }
}
