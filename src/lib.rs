//! aoe-executor: closed-loop plan execution and replanning.
//!
//! Receives dispatched remediation plans, runs their actions in order against pluggable
//! executors, records declared and discovered facts in the shared fact base, checks the
//! plan's goal against that fact base and asks the planner for a new plan when the goal
//! was not reached.

pub mod cli;
pub mod composition;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod goal;
pub mod intake;
pub mod invoker;
pub mod logging;
pub mod replan;
pub mod store;
pub mod transport;
pub mod types;
