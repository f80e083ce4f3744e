//! Loader options, compiler configuration discovery, and their validation.
//!
//! The host hands the loader a set of [`LoaderOptions`]. From those this crate
//! locates and parses the compiler configuration file into
//! [`CompilerOptions`], forcing the settings the cache depends on (separate
//! source maps, emission never suppressed by diagnostics).

#![warn(missing_docs)]

pub mod compiler_options;
pub mod error;
pub mod loader;
pub mod options;

pub use compiler_options::{setup_compiler_options, CompilerOptions};
pub use error::{ConfigError, ConfigKind};
pub use loader::{load_options, load_options_from_str, OPTIONS_FILE};
pub use options::{
    default_cache_identifier, CacheOptions, CacheSetting, LoaderOptions, ResolvedCacheOptions,
    DEFAULT_CACHE_DIRECTORY, DEFAULT_TSCONFIG, LOADER_NAME,
};
