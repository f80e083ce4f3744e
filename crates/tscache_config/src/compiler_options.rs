//! Compiler configuration discovery and normalization.

use crate::error::{ConfigError, ConfigKind};
use crate::options::LoaderOptions;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Compiler settings read from the `compilerOptions` section of the
/// configuration file.
///
/// The flags the cache depends on are typed; everything else is carried
/// verbatim for the compiler to interpret.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Emit a separate source map next to every output.
    #[serde(default)]
    pub source_map: bool,
    /// Embed the source map into the output instead.
    #[serde(default)]
    pub inline_source_map: bool,
    /// Suppress all output.
    #[serde(default)]
    pub no_emit: bool,
    /// Suppress output when any diagnostic is an error.
    #[serde(default)]
    pub no_emit_on_error: bool,
    /// Accept JavaScript sources.
    #[serde(default)]
    pub allow_js: bool,
    /// Enable the strict family of checks.
    #[serde(default)]
    pub strict: bool,
    /// Every other compiler option, untouched.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl CompilerOptions {
    /// Forces the settings emission relies on: separate source maps on,
    /// inline maps off, emission never suppressed.
    pub fn force_emit_settings(&mut self) {
        self.source_map = true;
        self.inline_source_map = false;
        self.no_emit = false;
        self.no_emit_on_error = false;
    }
}

/// Locates, reads and normalizes the compiler configuration.
///
/// Paths in `options` are resolved against `cwd`. Fails if the configuration
/// or the lint configuration is missing, or if the configuration is not
/// valid JSON with a well-formed `compilerOptions` object.
pub fn setup_compiler_options(
    options: &LoaderOptions,
    cwd: &Path,
    loader: &str,
) -> Result<CompilerOptions, ConfigError> {
    let (kind, relative) = options.config_file();
    let config_path = cwd.join(relative);

    if !config_path.is_file() {
        return Err(ConfigError::ConfigNotFound {
            loader: loader.to_string(),
            kind,
            path: config_path,
        });
    }
    if let Some(tslint) = &options.tslint {
        let tslint_path = cwd.join(tslint);
        if !tslint_path.is_file() {
            return Err(ConfigError::LintConfigNotFound {
                loader: loader.to_string(),
                path: tslint_path,
            });
        }
    }

    let parse_error = |reason: String| ConfigError::Parse {
        loader: loader.to_string(),
        reason,
        path: config_path.clone(),
    };

    let text = std::fs::read_to_string(&config_path).map_err(|e| parse_error(e.to_string()))?;
    let document: Value = serde_json::from_str(&text).map_err(|e| parse_error(e.to_string()))?;
    let section = document
        .get("compilerOptions")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    let mut compiler_options: CompilerOptions =
        serde_json::from_value(section).map_err(|e| parse_error(e.to_string()))?;

    if kind == ConfigKind::Jsconfig {
        compiler_options.allow_js = true;
    }
    compiler_options.force_emit_settings();
    Ok(compiler_options)
}
