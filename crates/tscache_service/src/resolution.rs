//! Process-lifetime cache of module resolutions.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;

use crate::compiler::ResolvedModule;

/// Caches resolutions by containing directory and module name.
///
/// Directory names are lower-cased when the filesystem is case-insensitive,
/// so `Src/` and `src/` share entries there.
#[derive(Debug)]
pub struct ModuleResolutionCache {
    case_sensitive: bool,
    entries: Mutex<HashMap<(String, String), ResolvedModule>>,
}

impl ModuleResolutionCache {
    /// Creates an empty cache.
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Normalizes a file name for use as a key.
    pub fn canonical_file_name(&self, file_name: &str) -> String {
        if self.case_sensitive {
            file_name.to_string()
        } else {
            file_name.to_lowercase()
        }
    }

    /// Returns the cached resolution of `module_name` from `containing_file`,
    /// calling `resolve` on a miss. Unresolvable modules become a
    /// [`ResolvedModule::passthrough`] entry.
    pub fn resolve<F>(&self, module_name: &str, containing_file: &str, resolve: F) -> ResolvedModule
    where
        F: FnOnce() -> Option<ResolvedModule>,
    {
        let directory = Path::new(containing_file)
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = (self.canonical_file_name(&directory), module_name.to_string());

        if let Some(hit) = self.entries.lock().get(&key) {
            tracing::trace!(module_name, containing_file, "resolution cache hit");
            return hit.clone();
        }
        tracing::trace!(module_name, containing_file, "resolution cache miss");

        // Resolve without holding the lock: the resolver may re-enter the host.
        let resolved = resolve().unwrap_or_else(|| ResolvedModule::passthrough(module_name));
        self.entries.lock().insert(key, resolved.clone());
        resolved
    }

    /// Number of cached resolutions.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
