//! Merge rules: built-in defaults underneath every other layer.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("fact_store.backend", "redis")?
        .set_default("fact_store.hash_key", crate::store::DEFAULT_FACT_BASE_KEY)?
        .set_default("transport.plans_queue", "aoe:plans")?
        .set_default("transport.processing_queue", "aoe:plans:processing")?
        .set_default("transport.replan_queue", "aoe:replan")?
        .set_default("executor.http_timeout_secs", 10)
}
