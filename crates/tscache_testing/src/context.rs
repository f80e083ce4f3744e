//! A build host that records what the loader does.

use std::path::{Path, PathBuf};

use tscache_loader::LoaderContext;

/// Host context for one module, recording every callback.
#[derive(Debug, Clone, Default)]
pub struct RecordingContext {
    /// The module being loaded.
    pub resource: PathBuf,
    /// File dependencies, initial ones plus any the loader added.
    pub dependencies: Vec<PathBuf>,
    /// Directory dependencies.
    pub context_dependencies: Vec<PathBuf>,
    /// The loader chain.
    pub loaders: Vec<PathBuf>,
    /// Reported errors.
    pub errors: Vec<String>,
    /// Reported warnings.
    pub warnings: Vec<String>,
    /// Last value passed to `set_cacheable`.
    pub cacheable: Option<bool>,
}

impl RecordingContext {
    /// A context for `resource` depending only on itself.
    pub fn new(resource: impl Into<PathBuf>) -> Self {
        let resource = resource.into();
        Self {
            dependencies: vec![resource.clone()],
            resource,
            ..Self::default()
        }
    }

    /// Adds an initial file dependency.
    pub fn with_dependency(mut self, path: impl Into<PathBuf>) -> Self {
        self.dependencies.push(path.into());
        self
    }

    /// Adds an initial directory dependency.
    pub fn with_context_dependency(mut self, path: impl Into<PathBuf>) -> Self {
        self.context_dependencies.push(path.into());
        self
    }

    /// Adds a loader to the chain.
    pub fn with_loader(mut self, path: impl Into<PathBuf>) -> Self {
        self.loaders.push(path.into());
        self
    }
}

impl LoaderContext for RecordingContext {
    fn resource_path(&self) -> &Path {
        &self.resource
    }

    fn dependencies(&self) -> Vec<PathBuf> {
        self.dependencies.clone()
    }

    fn context_dependencies(&self) -> Vec<PathBuf> {
        self.context_dependencies.clone()
    }

    fn loader_paths(&self) -> Vec<PathBuf> {
        self.loaders.clone()
    }

    fn add_dependency(&mut self, path: &Path) {
        if !self.dependencies.iter().any(|p| p == path) {
            self.dependencies.push(path.to_path_buf());
        }
    }

    fn add_context_dependency(&mut self, path: &Path) {
        if !self.context_dependencies.iter().any(|p| p == path) {
            self.context_dependencies.push(path.to_path_buf());
        }
    }

    fn emit_error(&mut self, message: String) {
        self.errors.push(message);
    }

    fn emit_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    fn set_cacheable(&mut self, cacheable: bool) {
        self.cacheable = Some(cacheable);
    }
}
