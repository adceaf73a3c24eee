//! Builds an [`EngineConfig`] from the layered sources.

use super::merge_policy::builder_with_defaults;
use super::sources::{global_file, workspace_file};
use super::EngineConfig;
use crate::error::EngineError;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix for `AOE__SECTION__KEY` overrides.
const ENV_PREFIX: &str = "AOE";
const ENV_SEPARATOR: &str = "__";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from defaults, the user file, the working directory files and the environment.
    pub fn load(workspace_root: &Path) -> Result<EngineConfig, EngineError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        Self::finish(builder)
    }

    /// Load from defaults, one explicit file and the environment. The file must exist.
    pub fn load_from_file(path: &Path) -> Result<EngineConfig, EngineError> {
        if !path.exists() {
            return Err(EngineError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = builder_with_defaults()?.add_source(File::from(path).required(true));
        Self::finish(builder)
    }

    /// Pick [`ConfigLoader::load_from_file`] when a path was given, [`ConfigLoader::load`]
    /// otherwise.
    pub fn resolve(
        explicit: Option<&Path>,
        workspace_root: &Path,
    ) -> Result<EngineConfig, EngineError> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => Self::load(workspace_root),
        }
    }

    /// Location of the user config file.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<EngineConfig, EngineError> {
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;
        let config: EngineConfig = settings.try_deserialize()?;
        debug!(
            backend = %config.fact_store.backend,
            plans_queue = %config.transport.plans_queue,
            "Configuration loaded"
        );
        Ok(config)
    }
}
