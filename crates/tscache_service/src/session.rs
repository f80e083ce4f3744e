//! The compilation session: one language service and all state it reads.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tscache_common::{ContentHash, InternalError};
use tscache_config::CompilerOptions;
use tscache_diagnostics::{DiagnosticMessage, RawDiagnostic};
use tscache_source::{fix_source_map, SourceMap};

use crate::compiler::{
    Compiler, CustomTransformers, LanguageService, LanguageServiceHost, Linter, TranspileRequest,
    TransformersFactory,
};
use crate::error::ServiceError;
use crate::host::{InFlight, ServiceHost};
use crate::lint::LintedService;
use crate::registry::FileRegistry;
use crate::resolution::ModuleResolutionCache;
use crate::text_cache::SourceTextCache;

/// A session shared between the build host and the file watcher.
pub type SharedSession = Arc<Mutex<Session>>;

/// Diagnostics of `file_name` in reporting order: compiler options first,
/// then syntactic, then semantic.
pub fn collect_diagnostics(
    service: &mut dyn LanguageService,
    host: &dyn LanguageServiceHost,
    file_name: &str,
) -> Vec<RawDiagnostic> {
    let mut diagnostics = service.compiler_options_diagnostics(host);
    diagnostics.extend(service.syntactic_diagnostics(host, file_name));
    diagnostics.extend(service.semantic_diagnostics(host, file_name));
    diagnostics
}

/// Output of [`Session::compile`]. The registry no longer holds the content.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFile {
    /// Emitted JavaScript.
    pub content: String,
    /// Source map bound to the compiled file.
    pub source_map: SourceMap,
    /// Normalized diagnostics of the compile.
    pub diagnostics: Vec<DiagnosticMessage>,
    /// `true` if this call registered the file; the caller should start
    /// watching it.
    pub newly_registered: bool,
}

/// Configures and creates a [`Session`].
pub struct SessionBuilder {
    compiler: Arc<dyn Compiler>,
    options: CompilerOptions,
    cwd: Option<PathBuf>,
    lint: Option<(Arc<dyn Linter>, PathBuf)>,
    transformers: Option<TransformersFactory>,
}

impl SessionBuilder {
    /// Uses `cwd` as the current directory instead of the process one.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Merges lint findings configured by `config_path` into the semantic
    /// diagnostics.
    pub fn lint(mut self, linter: Arc<dyn Linter>, config_path: impl Into<PathBuf>) -> Self {
        self.lint = Some((linter, config_path.into()));
        self
    }

    /// Supplies the transform plugins used for every emit.
    pub fn transformers(mut self, factory: TransformersFactory) -> Self {
        self.transformers = Some(factory);
        self
    }

    /// Creates the language service and the session around it.
    pub fn build(self) -> Result<Session, ServiceError> {
        let cwd = match self.cwd {
            Some(cwd) => cwd,
            None => std::env::current_dir()
                .map_err(|e| InternalError::new(format!("cannot read current directory: {e}")))?,
        };
        let mut service = self.compiler.create_language_service();
        if let Some((linter, config_path)) = &self.lint {
            let provider = linter.create_provider(config_path)?;
            service = Box::new(LintedService::new(service, provider));
        }
        let case_sensitive = self.compiler.use_case_sensitive_file_names();
        let transformers: TransformersFactory = match self.transformers {
            Some(factory) => factory,
            None => Arc::new(CustomTransformers::default),
        };
        tracing::debug!(cwd = %cwd.display(), lint = self.lint.is_some(), "language service created");

        Ok(Session {
            service,
            state: SessionState {
                compiler: self.compiler,
                options: self.options,
                cwd,
                registry: FileRegistry::new(),
                resolution: ModuleResolutionCache::new(case_sensitive),
                texts: SourceTextCache::new(),
                transformers,
                in_flight: None,
            },
        })
    }
}

struct SessionState {
    compiler: Arc<dyn Compiler>,
    options: CompilerOptions,
    cwd: PathBuf,
    registry: FileRegistry,
    resolution: ModuleResolutionCache,
    texts: SourceTextCache,
    transformers: TransformersFactory,
    in_flight: Option<InFlight>,
}

impl SessionState {
    fn host(&self) -> ServiceHost<'_> {
        ServiceHost {
            compiler: self.compiler.as_ref(),
            options: &self.options,
            cwd: &self.cwd,
            registry: &self.registry,
            resolution: &self.resolution,
            texts: &self.texts,
            transformers: &self.transformers,
            in_flight: self.in_flight.as_ref(),
        }
    }

    fn bump(&mut self, file: &str) -> Result<u32, ServiceError> {
        self.registry
            .bump(file)
            .ok_or_else(|| ServiceError::UnknownFile(file.to_string()))
    }
}

/// Owns the process's single language service.
///
/// Every file the build host hands over is registered once and compiled on
/// demand. Output stays in the registry until the caller takes it.
pub struct Session {
    service: Box<dyn LanguageService>,
    state: SessionState,
}

impl Session {
    /// Starts configuring a session for `compiler` with `options`.
    pub fn builder(compiler: Arc<dyn Compiler>, options: CompilerOptions) -> SessionBuilder {
        SessionBuilder {
            compiler,
            options,
            cwd: None,
            lint: None,
            transformers: None,
        }
    }

    /// Wraps the session for sharing with a watcher.
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// The file registry.
    pub fn registry(&self) -> &FileRegistry {
        &self.state.registry
    }

    /// The options every file is compiled with.
    pub fn options(&self) -> &CompilerOptions {
        &self.state.options
    }

    /// The directory relative paths are resolved against.
    pub fn cwd(&self) -> &Path {
        &self.state.cwd
    }

    /// The host view the language service sees.
    pub fn host(&self) -> ServiceHost<'_> {
        self.state.host()
    }

    /// Registers `file`. Returns `false` if it was already known.
    pub fn register(&mut self, file: &str) -> bool {
        self.state.registry.register(file)
    }

    /// Diagnostics of `file` in reporting order, normalized.
    pub fn diagnostics(&mut self, file: &str) -> Vec<DiagnosticMessage> {
        let host = self.state.host();
        collect_diagnostics(self.service.as_mut(), &host, file)
            .iter()
            .map(DiagnosticMessage::from_raw)
            .collect()
    }

    /// Transpiles `file` from `source` without type information, then
    /// refreshes its diagnostics through the service.
    pub fn transpile_source(&mut self, file: &str, source: &str) -> Result<(), ServiceError> {
        self.with_in_flight(file, source, |session| session.transpile_in_flight(file, source))
    }

    fn transpile_in_flight(&mut self, file: &str, source: &str) -> Result<(), ServiceError> {
        self.state.bump(file)?;
        let transformers = (self.state.transformers)();
        let output = self.state.compiler.transpile_module(TranspileRequest {
            file_name: file,
            source,
            compiler_options: &self.state.options,
            transformers: &transformers,
        });
        let source_map = bind_source_map(file, output.source_map_text.as_deref())?;
        let diagnostics = self.diagnostics(file);
        self.state.registry.set_output(
            file,
            source_hash(source),
            output.output_text,
            source_map,
            diagnostics,
        );
        Ok(())
    }

    /// Emits `file` through the language service, reading its text from the
    /// in-flight source if one is set and from disk otherwise.
    pub fn emit_via_service(&mut self, file: &str) -> Result<(), ServiceError> {
        self.state.bump(file)?;
        let hash = self.current_source_hash(file);
        let output = self.service.emit_output(&self.state.host(), file);
        let content = output
            .find(".js")
            .map(|f| f.text.clone())
            .ok_or_else(|| InternalError::new(format!("compiler emitted no JavaScript for {file}")))?;
        let source_map = bind_source_map(file, output.find(".map").map(|f| f.text.as_str()))?;
        let diagnostics = self.diagnostics(file);
        self.state
            .registry
            .set_output(file, hash, content, source_map, diagnostics);
        Ok(())
    }

    /// Returns `true` if `file` holds output produced from the text the
    /// compiler currently sees for it: the in-flight source while compiling,
    /// the file on disk otherwise.
    pub fn is_current(&self, file: &str) -> bool {
        self.state
            .registry
            .is_emitted_from(file, self.current_source_hash(file))
    }

    fn current_source_hash(&self, file: &str) -> ContentHash {
        let text = self.state.host().script_snapshot(file);
        source_hash(text.as_deref().unwrap_or_default())
    }

    /// Produces the output of `file` for one build request.
    ///
    /// A file seen for the first time is registered and transpiled from
    /// `source`. A known file is re-emitted through the service unless the
    /// registry holds output produced from exactly `source`. Either way the
    /// output is moved out of the registry.
    pub fn compile(&mut self, file: &str, source: &str) -> Result<CompiledFile, ServiceError> {
        self.with_in_flight(file, source, |session| {
            let newly_registered = session.register(file);
            if newly_registered {
                session.transpile_in_flight(file, source)?;
            }
            if !session.is_current(file) {
                session.emit_via_service(file)?;
            }
            let diagnostics = session
                .state
                .registry
                .get(file)
                .map(|entry| entry.diagnostics.clone())
                .unwrap_or_default();
            let (content, source_map) = session.state.registry.take(file).ok_or_else(|| {
                InternalError::new(format!("no output recorded for {file} after emit"))
            })?;
            Ok(CompiledFile {
                content,
                source_map,
                diagnostics,
                newly_registered,
            })
        })
    }

    /// Drops the output of `file` without returning it.
    pub fn clear(&mut self, file: &str) {
        self.state.registry.clear(file);
    }

    fn with_in_flight<R>(
        &mut self,
        file: &str,
        source: &str,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let previous = self.state.in_flight.replace(InFlight {
            file: file.to_string(),
            source: Arc::from(source),
        });
        let result = f(self);
        self.state.in_flight = previous;
        result
    }
}

fn bind_source_map(file: &str, text: Option<&str>) -> Result<SourceMap, ServiceError> {
    fix_source_map(file, text).map_err(|e| {
        ServiceError::from(InternalError::new(format!("malformed source map for {file}: {e}")))
    })
}

fn source_hash(text: &str) -> ContentHash {
    ContentHash::from_bytes(text.as_bytes())
}
