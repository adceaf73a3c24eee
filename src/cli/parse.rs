//! CLI parse: clap types for aoe-executor. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aoe-executor CLI - closed-loop plan execution and replanning
#[derive(Parser)]
#[command(name = "aoe-executor")]
#[command(about = "Execute remediation plans, verify goals against the fact base, request replans")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory searched for config/config.toml and config/{AOE_ENV}.toml
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (replaces the user and workspace config files)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short = 'q', default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes a file)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Consume plans from the plans queue until interrupted
    Run,
    /// Run one plan file through execute, evaluate and replan without a broker
    Execute {
        /// Plan JSON file
        #[arg(long)]
        plan: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Evaluate a goal against the fact base
    Check {
        /// Goal JSON file
        #[arg(long)]
        goal: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Inspect or seed the fact base
    Facts {
        #[command(subcommand)]
        command: FactsCommands,
    },
    /// Validate a plan file and enqueue it on the plans queue
    Dispatch {
        /// Plan JSON file
        #[arg(long)]
        plan: PathBuf,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum FactsCommands {
    /// List every predicate in the fact base
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Overwrite one predicate
    Set {
        predicate: String,
        value: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
}
