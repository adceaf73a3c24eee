//! User config file source: $XDG_CONFIG_HOME/aoe-executor/config.toml
//! (~/.config/aoe-executor/config.toml when XDG_CONFIG_HOME is unset).

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use directories::BaseDirs;
use std::path::PathBuf;
use tracing::debug;

const APP_DIR: &str = "aoe-executor";

/// Path to the user config file, if a home directory can be resolved.
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.config_dir().join(APP_DIR).join("config.toml"))
}

/// Add the user config file to the builder if it exists.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if let Some(path) = global_config_path() {
        if path.exists() {
            builder = builder.add_source(File::from(path.as_path()).required(false));
        } else {
            debug!(config_path = %path.display(), "No user config file");
        }
    }
    Ok(builder)
}
