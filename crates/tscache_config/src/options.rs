//! Options the host passes to the loader.

use crate::error::{ConfigError, ConfigKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name used to prefix fatal configuration errors.
pub const LOADER_NAME: &str = "tscache-loader";

/// Compiler configuration used when neither `tsconfig` nor `jsconfig` is set.
pub const DEFAULT_TSCONFIG: &str = "tsconfig.json";

/// Cache directory used when caching is enabled without an explicit directory.
pub const DEFAULT_CACHE_DIRECTORY: &str = ".cache-typescript";

/// Environment variable naming the build environment baked into cache identifiers.
const BUILD_ENV_VAR: &str = "NODE_ENV";

/// Options recognized by the loader.
///
/// Unknown keys are rejected. `tsconfig` and `jsconfig` are mutually
/// exclusive; see [`LoaderOptions::validate`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoaderOptions {
    /// Path to a TypeScript project configuration.
    #[serde(default)]
    pub tsconfig: Option<PathBuf>,
    /// Path to a JavaScript project configuration.
    #[serde(default)]
    pub jsconfig: Option<PathBuf>,
    /// Path to a lint configuration. Enables the lint diagnostics provider.
    #[serde(default)]
    pub tslint: Option<PathBuf>,
    /// Name of the lint formatter used to render every diagnostic.
    #[serde(default)]
    pub tslint_formatter: Option<String>,
    /// Persistent cache settings.
    #[serde(default)]
    pub cache: CacheSetting,
}

/// Either a plain on/off switch or overrides for the cache defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CacheSetting {
    /// `cache: true` enables caching with defaults, `false` disables it.
    Enabled(bool),
    /// Caching enabled with some defaults overridden.
    Custom(CacheOptions),
}

impl Default for CacheSetting {
    fn default() -> Self {
        CacheSetting::Enabled(false)
    }
}

/// Overrides for the persistent cache.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CacheOptions {
    /// Identity string mixed into every cache key.
    #[serde(default)]
    pub cache_identifier: Option<String>,
    /// Directory holding the cache files.
    #[serde(default)]
    pub cache_directory: Option<PathBuf>,
}

/// Cache settings with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCacheOptions {
    /// Identity string mixed into every cache key.
    pub identifier: String,
    /// Absolute directory holding the cache files.
    pub directory: PathBuf,
}

/// The identifier used when none is configured:
/// `cache-typescript:<version> <env>`.
pub fn default_cache_identifier(env: &str) -> String {
    format!("cache-typescript:{} {env}", env!("CARGO_PKG_VERSION"))
}

fn build_env() -> String {
    std::env::var(BUILD_ENV_VAR).unwrap_or_else(|_| "development".to_string())
}

impl LoaderOptions {
    /// Parses and validates options handed over by the host as JSON.
    pub fn from_json(value: serde_json::Value, loader: &str) -> Result<Self, ConfigError> {
        let options: LoaderOptions =
            serde_json::from_value(value).map_err(|e| ConfigError::InvalidOptions {
                loader: loader.to_string(),
                reason: e.to_string(),
            })?;
        options.validate(loader)?;
        Ok(options)
    }

    /// Checks constraints serde cannot express.
    pub fn validate(&self, loader: &str) -> Result<(), ConfigError> {
        if self.tsconfig.is_some() && self.jsconfig.is_some() {
            return Err(ConfigError::InvalidOptions {
                loader: loader.to_string(),
                reason: "`tsconfig` and `jsconfig` cannot both be set".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the active configuration kind and its (unresolved) path.
    pub fn config_file(&self) -> (ConfigKind, &Path) {
        match (&self.tsconfig, &self.jsconfig) {
            (Some(path), _) => (ConfigKind::Tsconfig, path.as_path()),
            (None, Some(path)) => (ConfigKind::Jsconfig, path.as_path()),
            (None, None) => (ConfigKind::Tsconfig, Path::new(DEFAULT_TSCONFIG)),
        }
    }

    /// Returns `true` if the persistent cache is enabled.
    pub fn cache_enabled(&self) -> bool {
        !matches!(self.cache, CacheSetting::Enabled(false))
    }

    /// Resolves cache settings against `cwd`, or `None` when caching is off.
    pub fn cache_options(&self, cwd: &Path) -> Option<ResolvedCacheOptions> {
        self.cache_options_for_env(cwd, &build_env())
    }

    fn cache_options_for_env(&self, cwd: &Path, env: &str) -> Option<ResolvedCacheOptions> {
        let overrides = match &self.cache {
            CacheSetting::Enabled(false) => return None,
            CacheSetting::Enabled(true) => CacheOptions::default(),
            CacheSetting::Custom(custom) => custom.clone(),
        };
        Some(ResolvedCacheOptions {
            identifier: overrides
                .cache_identifier
                .unwrap_or_else(|| default_cache_identifier(env)),
            directory: cwd.join(
                overrides
                    .cache_directory
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIRECTORY)),
            ),
        })
    }
}
