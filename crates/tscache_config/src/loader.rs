//! Loading loader options from a `tscache.toml` file.

use crate::error::ConfigError;
use crate::options::{LoaderOptions, LOADER_NAME};
use std::path::Path;

/// File name looked up by [`load_options`].
pub const OPTIONS_FILE: &str = "tscache.toml";

/// Loads and validates `<project_dir>/tscache.toml`.
pub fn load_options(project_dir: &Path) -> Result<LoaderOptions, ConfigError> {
    let content = std::fs::read_to_string(project_dir.join(OPTIONS_FILE))?;
    load_options_from_str(&content)
}

/// Parses and validates loader options from TOML text.
///
/// Keys use the same camelCase spelling as the JSON form.
pub fn load_options_from_str(content: &str) -> Result<LoaderOptions, ConfigError> {
    let options: LoaderOptions =
        toml::from_str(content).map_err(|e| ConfigError::InvalidOptions {
            loader: LOADER_NAME.to_string(),
            reason: e.to_string(),
        })?;
    options.validate(LOADER_NAME)?;
    Ok(options)
}
