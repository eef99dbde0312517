//! Config validation.

use std::path::Path;

use nova_core::config::GameConfig;
use tracing::debug;

use crate::{read_file, Result};

/// Load and validate a RON config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, does not parse, or holds
/// values the core cannot run with.
pub fn validate_config_file(path: &Path) -> Result<GameConfig> {
    let text = read_file(path)?;
    let config = GameConfig::from_ron_str(&text)?;
    debug!(?config, "Config parsed");
    Ok(config)
}

/// Load a config file, or the defaults when no path is given.
///
/// # Errors
///
/// Same as [`validate_config_file`].
pub fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    path.map_or_else(|| Ok(GameConfig::default()), validate_config_file)
}
