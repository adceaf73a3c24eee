//! Action Invoker
//!
//! Dispatches one action to the executor named by its kind tag and returns the facts the
//! executor's response asserts. Adding an executor kind means adding an [`ExecutorKind`]
//! variant and a handler here.

use crate::error::InvokeError;
use crate::types::{Action, ExecutorKind, FactMap};
use async_trait::async_trait;
use std::time::Duration;

pub mod cli;
pub mod http;

pub use cli::CliExecutor;
pub use http::{HttpExecutor, DEFAULT_ACTION_TIMEOUT};

/// Performs an action's real-world side effect.
#[async_trait]
pub trait ActionInvoker: Send + Sync {
    /// Invoke one action. `Ok` carries the discovered facts (possibly empty); any `Err` is
    /// terminal for the action and is never retried here.
    async fn invoke(&self, action: &Action) -> Result<FactMap, InvokeError>;
}

/// Invoker that routes on `executor.type`.
pub struct ExecutorInvoker {
    http: HttpExecutor,
    cli: CliExecutor,
}

impl ExecutorInvoker {
    pub fn new(http_timeout: Duration) -> Result<Self, InvokeError> {
        Ok(Self {
            http: HttpExecutor::new(http_timeout)?,
            cli: CliExecutor,
        })
    }
}

#[async_trait]
impl ActionInvoker for ExecutorInvoker {
    async fn invoke(&self, action: &Action) -> Result<FactMap, InvokeError> {
        match &action.executor.kind {
            ExecutorKind::Http => self.http.execute(&action.executor).await,
            ExecutorKind::Cli => self.cli.execute(action).await,
            ExecutorKind::Unknown(tag) => Err(InvokeError::UnknownKind(tag.clone())),
        }
    }
}
