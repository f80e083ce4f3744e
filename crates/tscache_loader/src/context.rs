//! What the loader needs from the build host for one module.

use std::path::{Path, PathBuf};

/// The build host's per-module invocation context.
pub trait LoaderContext {
    /// Absolute path of the module being loaded.
    fn resource_path(&self) -> &Path;

    /// Files the module's output depends on.
    fn dependencies(&self) -> Vec<PathBuf>;

    /// Directories the module's output depends on.
    fn context_dependencies(&self) -> Vec<PathBuf>;

    /// Paths of every loader in the chain applied to the module.
    fn loader_paths(&self) -> Vec<PathBuf>;

    /// Adds a file dependency.
    fn add_dependency(&mut self, path: &Path);

    /// Adds a directory dependency.
    fn add_context_dependency(&mut self, path: &Path);

    /// Reports an error for the module. The build continues.
    fn emit_error(&mut self, message: String);

    /// Reports a warning for the module.
    fn emit_warning(&mut self, message: String);

    /// Tells the host whether the result may be reused across builds.
    fn set_cacheable(&mut self, cacheable: bool);
}
