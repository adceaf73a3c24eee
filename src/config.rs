//! Configuration System
//!
//! Layered configuration for the engine: built-in defaults, the user's XDG config file,
//! `config/config.toml` and `config/{AOE_ENV}.toml` under the working directory, then
//! `AOE__SECTION__KEY` environment variables. An explicit `--config` file replaces the two
//! file layers.

use crate::logging::LoggingConfig;
use crate::store::DEFAULT_FACT_BASE_KEY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

mod loader;
mod merge_policy;
mod sources;

pub use loader::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub fact_store: FactStoreConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which fact store implementation backs the fact base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactStoreBackend {
    #[default]
    Redis,
    Sled,
    Memory,
}

impl std::fmt::Display for FactStoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FactStoreBackend::Redis => "redis",
            FactStoreBackend::Sled => "sled",
            FactStoreBackend::Memory => "memory",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactStoreConfig {
    #[serde(default)]
    pub backend: FactStoreBackend,

    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Redis hash key, or sled tree name, holding the fact base
    #[serde(default = "default_hash_key")]
    pub hash_key: String,

    #[serde(default = "default_sled_path")]
    pub sled_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default = "default_plans_queue")]
    pub plans_queue: String,

    /// Holds deliveries between receipt and ack
    #[serde(default = "default_processing_queue")]
    pub processing_queue: String,

    #[serde(default = "default_replan_queue")]
    pub replan_queue: String,

    /// Rejected payloads are pushed here when set, dropped otherwise
    #[serde(default)]
    pub dead_letter_queue: Option<String>,

    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Requeue deliveries left in the processing queue on startup
    #[serde(default = "default_true")]
    pub recover_in_flight: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Predicate set to "true" when a plan fails
    #[serde(default)]
    pub failure_fact: Option<String>,
}

pub(crate) fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_hash_key() -> String {
    DEFAULT_FACT_BASE_KEY.to_string()
}

pub(crate) fn default_sled_path() -> PathBuf {
    PathBuf::from(".aoe/facts")
}

fn default_plans_queue() -> String {
    "aoe:plans".to_string()
}

fn default_processing_queue() -> String {
    "aoe:plans:processing".to_string()
}

fn default_replan_queue() -> String {
    "aoe:replan".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    5
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for FactStoreConfig {
    fn default() -> Self {
        Self {
            backend: FactStoreBackend::default(),
            redis_url: default_redis_url(),
            hash_key: default_hash_key(),
            sled_path: default_sled_path(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            plans_queue: default_plans_queue(),
            processing_queue: default_processing_queue(),
            replan_queue: default_replan_queue(),
            dead_letter_queue: None,
            poll_timeout_secs: default_poll_timeout_secs(),
            recover_in_flight: default_true(),
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout_secs(),
            failure_fact: None,
        }
    }
}

impl TransportConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

impl ExecutorConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    FactStore(String),
    Transport(String),
    Executor(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::FactStore(msg) => write!(f, "fact_store: {}", msg),
            ValidationError::Transport(msg) => write!(f, "transport: {}", msg),
            ValidationError::Executor(msg) => write!(f, "executor: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl FactStoreConfig {
    fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.hash_key.trim().is_empty() {
            problems.push("hash_key cannot be empty".to_string());
        }
        match self.backend {
            FactStoreBackend::Redis if self.redis_url.trim().is_empty() => {
                problems.push("redis_url is required for the redis backend".to_string())
            }
            FactStoreBackend::Sled if self.sled_path.as_os_str().is_empty() => {
                problems.push("sled_path is required for the sled backend".to_string())
            }
            _ => {}
        }
        problems
    }
}

impl TransportConfig {
    fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.redis_url.trim().is_empty() {
            problems.push("redis_url cannot be empty".to_string());
        }
        for (name, queue) in [
            ("plans_queue", &self.plans_queue),
            ("processing_queue", &self.processing_queue),
            ("replan_queue", &self.replan_queue),
        ] {
            if queue.trim().is_empty() {
                problems.push(format!("{} cannot be empty", name));
            }
        }
        if self.plans_queue == self.processing_queue {
            problems.push("plans_queue and processing_queue must differ".to_string());
        }
        if self.plans_queue == self.replan_queue {
            problems.push("plans_queue and replan_queue must differ".to_string());
        }
        if let Some(dead_letter) = &self.dead_letter_queue {
            if dead_letter == &self.plans_queue {
                problems.push("dead_letter_queue cannot be the plans_queue".to_string());
            }
        }
        if self.poll_timeout_secs == 0 {
            problems.push("poll_timeout_secs must be at least 1".to_string());
        }
        problems
    }
}

impl ExecutorConfig {
    fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.http_timeout_secs == 0 {
            problems.push("http_timeout_secs must be at least 1".to_string());
        }
        if let Some(fact) = &self.failure_fact {
            if fact.trim().is_empty() {
                problems.push("failure_fact cannot be empty when set".to_string());
            }
        }
        problems
    }
}

impl EngineConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors: Vec<ValidationError> = Vec::new();
        errors.extend(
            self.fact_store
                .validate()
                .into_iter()
                .map(ValidationError::FactStore),
        );
        errors.extend(
            self.transport
                .validate()
                .into_iter()
                .map(ValidationError::Transport),
        );
        errors.extend(
            self.executor
                .validate()
                .into_iter()
                .map(ValidationError::Executor),
        );
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Render as TOML, for `config show`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
