//! The language-service host the session presents to the compiler.

use std::path::Path;
use std::sync::Arc;

use tscache_config::CompilerOptions;

use crate::compiler::{
    Compiler, CustomTransformers, LanguageServiceHost, ModuleResolutionHost, ResolvedModule,
    TransformersFactory,
};
use crate::registry::FileRegistry;
use crate::resolution::ModuleResolutionCache;
use crate::text_cache::SourceTextCache;

/// Plain filesystem access, used by module resolution.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskHost;

impl ModuleResolutionHost for DiskHost {
    fn file_exists(&self, file_name: &str) -> bool {
        Path::new(file_name).is_file()
    }

    fn read_file(&self, file_name: &str) -> Option<Arc<str>> {
        std::fs::read_to_string(file_name).ok().map(Arc::from)
    }
}

/// The file currently being compiled, whose text may not be on disk yet.
#[derive(Debug, Clone)]
pub struct InFlight {
    /// File name.
    pub file: String,
    /// Text handed over by the build host.
    pub source: Arc<str>,
}

/// A borrowed view over session state answering the compiler's questions.
pub struct ServiceHost<'a> {
    pub(crate) compiler: &'a dyn Compiler,
    pub(crate) options: &'a CompilerOptions,
    pub(crate) cwd: &'a Path,
    pub(crate) registry: &'a FileRegistry,
    pub(crate) resolution: &'a ModuleResolutionCache,
    pub(crate) texts: &'a SourceTextCache,
    pub(crate) transformers: &'a TransformersFactory,
    pub(crate) in_flight: Option<&'a InFlight>,
}

impl ServiceHost<'_> {
    /// The in-flight source if `file_name` names the file being compiled,
    /// compared the way the filesystem compares names.
    fn in_flight_source(&self, file_name: &str) -> Option<Arc<str>> {
        let in_flight = self.in_flight?;
        let canonical = |name: &str| self.resolution.canonical_file_name(name);
        (canonical(&in_flight.file) == canonical(file_name)).then(|| in_flight.source.clone())
    }
}

impl ModuleResolutionHost for ServiceHost<'_> {
    fn file_exists(&self, file_name: &str) -> bool {
        self.in_flight_source(file_name).is_some() || DiskHost.file_exists(file_name)
    }

    fn read_file(&self, file_name: &str) -> Option<Arc<str>> {
        self.in_flight_source(file_name).or_else(|| self.texts.read(file_name))
    }
}

impl LanguageServiceHost for ServiceHost<'_> {
    fn script_file_names(&self) -> Vec<String> {
        self.registry.file_names().to_vec()
    }

    fn script_version(&self, file_name: &str) -> Option<String> {
        self.registry.version(file_name).map(|v| v.to_string())
    }

    fn script_snapshot(&self, file_name: &str) -> Option<Arc<str>> {
        self.in_flight_source(file_name).or_else(|| DiskHost.read_file(file_name))
    }

    fn compilation_settings(&self) -> &CompilerOptions {
        self.options
    }

    fn current_directory(&self) -> &Path {
        self.cwd
    }

    fn default_lib_file_name(&self) -> String {
        self.compiler.default_lib_file_name(self.options)
    }

    fn use_case_sensitive_file_names(&self) -> bool {
        self.compiler.use_case_sensitive_file_names()
    }

    fn custom_transformers(&self) -> CustomTransformers {
        (self.transformers)()
    }

    fn resolve_module_names(
        &self,
        module_names: &[String],
        containing_file: &str,
    ) -> Vec<ResolvedModule> {
        module_names
            .iter()
            .map(|name| {
                self.resolution.resolve(name, containing_file, || {
                    self.compiler
                        .resolve_module_name(name, containing_file, self.options, &DiskHost)
                })
            })
            .collect()
    }
}
