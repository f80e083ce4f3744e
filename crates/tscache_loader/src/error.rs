//! Errors surfaced to the build host.

use std::sync::Arc;
use tscache_config::ConfigError;
use tscache_service::ServiceError;

/// A failure that aborts a module build.
///
/// Configuration errors are detected once and then returned by every
/// subsequent invocation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoaderError {
    /// The loader or compiler configuration is unusable.
    #[error(transparent)]
    Config(Arc<ConfigError>),

    /// The compiler service failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl From<ConfigError> for LoaderError {
    fn from(err: ConfigError) -> Self {
        LoaderError::Config(Arc::new(err))
    }
}
