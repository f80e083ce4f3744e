//! The contract between the session and the underlying compiler.
//!
//! The compiler is a collaborator: it owns parsing, type checking and code
//! generation. The session drives it through [`Compiler`] (stateless
//! primitives) and [`LanguageService`] (the incremental service), and
//! answers its questions about the file universe through a
//! [`LanguageServiceHost`] handed in on every call.

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use tscache_config::CompilerOptions;
use tscache_diagnostics::{LintFormatter, RawDiagnostic};

use crate::error::ServiceError;

/// One file produced by a service-driven emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Output file name as chosen by the compiler (`*.js`, `*.js.map`, ...).
    pub name: String,
    /// Output text.
    pub text: String,
}

/// Result of [`LanguageService::emit_output`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitOutput {
    /// Files produced for the requested source.
    pub output_files: Vec<OutputFile>,
    /// `true` if the compiler declined to emit.
    pub emit_skipped: bool,
}

impl EmitOutput {
    /// The first output whose name ends with `suffix`.
    pub fn find(&self, suffix: &str) -> Option<&OutputFile> {
        self.output_files.iter().find(|f| f.name.ends_with(suffix))
    }
}

/// Input to the single-file transpile primitive.
pub struct TranspileRequest<'a> {
    /// Name of the file being transpiled.
    pub file_name: &'a str,
    /// Its source text.
    pub source: &'a str,
    /// Options the output is generated with.
    pub compiler_options: &'a CompilerOptions,
    /// Transform plugins to apply.
    pub transformers: &'a CustomTransformers,
}

/// Result of [`Compiler::transpile_module`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranspileOutput {
    /// Emitted JavaScript.
    pub output_text: String,
    /// Raw source map JSON, when source maps are enabled.
    pub source_map_text: Option<String>,
}

/// A module resolved for the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    /// File the import resolved to.
    pub resolved_file_name: String,
    /// Extension of that file, including the dot; empty when unknown.
    pub extension: String,
    /// `true` if the module lives outside the project sources.
    pub is_external_library_import: bool,
    /// Package identity, when resolved through a package manifest.
    pub package_id: Option<String>,
}

impl ResolvedModule {
    /// The entry returned for imports the compiler could not resolve: an
    /// external library named after the literal request.
    pub fn passthrough(module_name: &str) -> Self {
        Self {
            resolved_file_name: module_name.to_string(),
            extension: String::new(),
            is_external_library_import: true,
            package_id: None,
        }
    }
}

/// Transform plugins for the compiler, opaque to the session.
#[derive(Clone, Default)]
pub struct CustomTransformers {
    /// Transforms run before the built-in ones.
    pub before: Vec<Arc<dyn Any + Send + Sync>>,
    /// Transforms run after the built-in ones.
    pub after: Vec<Arc<dyn Any + Send + Sync>>,
}

impl CustomTransformers {
    /// Returns `true` if there are no transforms at all.
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

impl std::fmt::Debug for CustomTransformers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomTransformers")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish()
    }
}

/// Builds the transformers handed to the compiler.
pub type TransformersFactory = Arc<dyn Fn() -> CustomTransformers + Send + Sync>;

/// The filesystem primitives module resolution needs.
pub trait ModuleResolutionHost {
    /// Returns `true` if `file_name` exists.
    fn file_exists(&self, file_name: &str) -> bool;
    /// Reads `file_name`, or `None` if it cannot be read.
    fn read_file(&self, file_name: &str) -> Option<Arc<str>>;
}

/// What the incremental service asks of its host.
pub trait LanguageServiceHost: ModuleResolutionHost {
    /// Every file the service should know about, in registration order.
    fn script_file_names(&self) -> Vec<String>;
    /// Version of `file_name`; `None` for files outside the universe.
    fn script_version(&self, file_name: &str) -> Option<String>;
    /// Current text of `file_name`.
    fn script_snapshot(&self, file_name: &str) -> Option<Arc<str>>;
    /// Options every file is compiled with.
    fn compilation_settings(&self) -> &CompilerOptions;
    /// Directory relative paths are resolved against.
    fn current_directory(&self) -> &Path;
    /// Path of the default library declarations.
    fn default_lib_file_name(&self) -> String;
    /// Whether file names differing only in case are distinct.
    fn use_case_sensitive_file_names(&self) -> bool;
    /// Transform plugins applied during emit.
    fn custom_transformers(&self) -> CustomTransformers;
    /// Resolves every import of `containing_file`. Always returns one entry
    /// per module name.
    fn resolve_module_names(&self, module_names: &[String], containing_file: &str)
        -> Vec<ResolvedModule>;
}

/// The compiler's incremental language service.
///
/// The service re-analyzes a file only when the host reports a new version
/// for it.
pub trait LanguageService: Send {
    /// Emits `file_name` through the full program.
    fn emit_output(&mut self, host: &dyn LanguageServiceHost, file_name: &str) -> EmitOutput;
    /// Global diagnostics about the compiler options.
    fn compiler_options_diagnostics(&mut self, host: &dyn LanguageServiceHost)
        -> Vec<RawDiagnostic>;
    /// Parse errors in `file_name`.
    fn syntactic_diagnostics(&mut self, host: &dyn LanguageServiceHost, file_name: &str)
        -> Vec<RawDiagnostic>;
    /// Type errors in `file_name`.
    fn semantic_diagnostics(&mut self, host: &dyn LanguageServiceHost, file_name: &str)
        -> Vec<RawDiagnostic>;
}

/// Stateless compiler primitives and the language service factory.
pub trait Compiler: Send + Sync {
    /// Creates a fresh incremental service.
    fn create_language_service(&self) -> Box<dyn LanguageService>;

    /// Transforms a single file without type information.
    fn transpile_module(&self, request: TranspileRequest<'_>) -> TranspileOutput;

    /// Resolves one import. `None` if the module cannot be found.
    fn resolve_module_name(
        &self,
        module_name: &str,
        containing_file: &str,
        options: &CompilerOptions,
        host: &dyn ModuleResolutionHost,
    ) -> Option<ResolvedModule>;

    /// Path of the default library declarations for `options`.
    fn default_lib_file_name(&self, options: &CompilerOptions) -> String;

    /// Whether the filesystem distinguishes file names by case.
    fn use_case_sensitive_file_names(&self) -> bool;
}

/// A lint diagnostics provider attached to the language service.
pub trait LintProvider: Send {
    /// Lint findings for `file_name`.
    fn lint(&mut self, host: &dyn LanguageServiceHost, file_name: &str) -> Vec<RawDiagnostic>;
}

/// A lint library.
pub trait Linter: Send + Sync {
    /// Creates a provider configured from `config_path`.
    fn create_provider(&self, config_path: &Path) -> Result<Box<dyn LintProvider>, ServiceError>;

    /// Looks up a formatter by name.
    fn find_formatter(&self, name: &str) -> Option<Box<dyn LintFormatter>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_module_is_external() {
        let module = ResolvedModule::passthrough("@app/missing");
        assert_eq!(module.resolved_file_name, "@app/missing");
        assert_eq!(module.extension, "");
        assert!(module.is_external_library_import);
        assert!(module.package_id.is_none());
    }

    #[test]
    fn emit_output_find_by_suffix() {
        let output = EmitOutput {
            output_files: vec![
                OutputFile { name: "a.js.map".into(), text: "{}".into() },
                OutputFile { name: "a.js".into(), text: "var a;".into() },
            ],
            emit_skipped: false,
        };
        assert_eq!(output.find(".map").unwrap().name, "a.js.map");
        assert_eq!(output.find(".js").unwrap().text, "var a;");
        assert!(output.find(".d.ts").is_none());
    }

    #[test]
    fn transformers_debug_shows_counts() {
        let transformers = CustomTransformers {
            before: vec![Arc::new(1u8) as Arc<dyn Any + Send + Sync>],
            after: vec![],
        };
        assert!(!transformers.is_empty());
        assert_eq!(
            format!("{transformers:?}"),
            "CustomTransformers { before: 1, after: 0 }"
        );
    }
}
