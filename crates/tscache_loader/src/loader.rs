//! The two-phase loader.
//!
//! The pitch phase answers a request from the persistent cache when every
//! dependency recorded with the entry is unchanged. Otherwise it records a
//! start time and lets the host run the normal phase, which compiles through
//! the shared [`Session`], reports diagnostics, and stores a fresh entry
//! unless some dependency changed after the start time.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tscache_cache::{
    first_in_flux, CacheEntry, CacheError, CacheStore, DependencyStatter, IoPool, JsonFileStore,
};
use tscache_common::Mtime;
use tscache_config::{setup_compiler_options, ConfigError, LoaderOptions, LOADER_NAME};
use tscache_diagnostics::{
    DefaultFormatter, DiagnosticFormatter, LintAdapterFormatter, ReportedMessage, Severity,
};
use tscache_service::{
    Compiler, CustomTransformers, Linter, Session, SharedSession, TransformersFactory,
    WatchScheduler,
};
use tscache_source::SourceMap;

use crate::context::LoaderContext;
use crate::error::LoaderError;
use crate::request::RequestData;
use crate::writes::PendingWrites;

/// The compiled output handed back to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderOutput {
    /// Emitted JavaScript.
    pub content: String,
    /// Source map bound to the module's path.
    pub source_map: SourceMap,
}

/// Result of [`Loader::pitch`].
#[derive(Debug, Clone, PartialEq)]
pub enum PitchOutcome {
    /// Nothing usable in the cache; the host should run the normal phase.
    Continue,
    /// The cached output; the host should skip the normal phase.
    Cached(LoaderOutput),
}

/// Configures a [`Loader`].
pub struct LoaderBuilder {
    compiler: Arc<dyn Compiler>,
    options: LoaderOptions,
    cwd: Option<PathBuf>,
    linter: Option<Arc<dyn Linter>>,
    transformers: Option<TransformersFactory>,
    store: Option<Arc<dyn CacheStore>>,
    io_threads: Option<usize>,
}

impl LoaderBuilder {
    /// Directory configuration paths and the default cache directory are
    /// resolved against. Defaults to the process's current directory.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// The lint library used when the `tslint` option is set.
    pub fn linter(mut self, linter: Arc<dyn Linter>) -> Self {
        self.linter = Some(linter);
        self
    }

    /// Transform plugins applied to every emit.
    pub fn transformers(mut self, factory: TransformersFactory) -> Self {
        self.transformers = Some(factory);
        self
    }

    /// Stores cache entries in `store` instead of JSON files. Enables the
    /// cache even if the options leave it off.
    pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Caps the threads used for dependency stats and cache writes.
    pub fn io_threads(mut self, threads: usize) -> Self {
        self.io_threads = Some(threads);
        self
    }

    /// Creates the loader. The compiler session is created lazily by the
    /// first [`Loader::run`].
    pub fn build(self) -> Result<Loader, ConfigError> {
        self.options.validate(LOADER_NAME)?;
        let cwd = match self.cwd {
            Some(cwd) => cwd,
            None => std::env::current_dir()?,
        };
        let store = self.store.or_else(|| {
            self.options.cache_options(&cwd).map(|resolved| {
                Arc::new(JsonFileStore::new(resolved.identifier, resolved.directory))
                    as Arc<dyn CacheStore>
            })
        });
        let pool = match self.io_threads {
            Some(threads) => IoPool::new(threads),
            None => IoPool::default(),
        };
        Ok(Loader {
            compiler: self.compiler,
            options: self.options,
            cwd,
            linter: self.linter,
            transformers: self
                .transformers
                .unwrap_or_else(|| Arc::new(CustomTransformers::default) as TransformersFactory),
            store,
            pool: Arc::new(pool),
            writes: Arc::new(PendingWrites::new()),
            runtime: OnceLock::new(),
        })
    }
}

struct Runtime {
    session: SharedSession,
    watcher: WatchScheduler,
    formatter: Box<dyn DiagnosticFormatter>,
}

/// Serves compile requests from the build host.
///
/// One loader is shared by every module of a build. It owns the single
/// compiler session and the persistent cache.
pub struct Loader {
    compiler: Arc<dyn Compiler>,
    options: LoaderOptions,
    cwd: PathBuf,
    linter: Option<Arc<dyn Linter>>,
    transformers: TransformersFactory,
    store: Option<Arc<dyn CacheStore>>,
    pool: Arc<IoPool>,
    writes: Arc<PendingWrites>,
    runtime: OnceLock<Result<Runtime, LoaderError>>,
}

impl Loader {
    /// Starts configuring a loader for `compiler`.
    pub fn builder(compiler: Arc<dyn Compiler>, options: LoaderOptions) -> LoaderBuilder {
        LoaderBuilder {
            compiler,
            options,
            cwd: None,
            linter: None,
            transformers: None,
            store: None,
            io_threads: None,
        }
    }

    /// Returns `true` if results are persisted.
    pub fn cache_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// The compiler session, once the first [`run`](Self::run) created it.
    pub fn session(&self) -> Option<&SharedSession> {
        match self.runtime.get() {
            Some(Ok(runtime)) => Some(&runtime.session),
            _ => None,
        }
    }

    /// The file watcher, once the first [`run`](Self::run) created it.
    pub fn watcher(&self) -> Option<&WatchScheduler> {
        match self.runtime.get() {
            Some(Ok(runtime)) => Some(&runtime.watcher),
            _ => None,
        }
    }

    /// Blocks until every detached cache write has finished.
    pub fn wait_for_writes(&self) {
        self.writes.wait();
    }

    /// The early phase: tries to answer `remaining_request` from the cache.
    ///
    /// Any cache problem is a miss. On a hit the recorded dependencies are
    /// re-added to the host and the recorded diagnostics replayed.
    pub fn pitch(
        &self,
        ctx: &mut dyn LoaderContext,
        remaining_request: &str,
        data: &mut RequestData,
    ) -> PitchOutcome {
        let Some(store) = &self.store else {
            return PitchOutcome::Continue;
        };
        let key = store.cache_key(remaining_request);
        data.remaining_request = Some(remaining_request.to_string());
        data.cache_key = Some(key.clone());

        let entry = match self.lookup(store.as_ref(), &key, remaining_request) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                tracing::debug!(request = remaining_request, "cache miss: no entry");
                data.start_time = Some(Mtime::now());
                return PitchOutcome::Continue;
            }
            Err(err) => {
                tracing::debug!(request = remaining_request, "cache miss: {err}");
                data.start_time = Some(Mtime::now());
                return PitchOutcome::Continue;
            }
        };

        tracing::debug!(request = remaining_request, "cache hit");
        for dependency in &entry.dependencies {
            ctx.add_dependency(&dependency.path);
        }
        for dependency in &entry.context_dependencies {
            ctx.add_context_dependency(&dependency.path);
        }
        for diagnostic in entry.diagnostics {
            report(ctx, diagnostic);
        }
        let (content, source_map) = entry.result;
        PitchOutcome::Cached(LoaderOutput {
            content,
            source_map,
        })
    }

    fn lookup(
        &self,
        store: &dyn CacheStore,
        key: &str,
        request: &str,
    ) -> Result<Option<CacheEntry>, CacheError> {
        let Some(entry) = store.read(key)? else {
            return Ok(None);
        };
        entry.check_request(request)?;
        DependencyStatter::new(&self.pool).validate(entry.all_dependencies())?;
        Ok(Some(entry))
    }

    /// The normal phase: compiles the module and reports its diagnostics.
    ///
    /// With caching enabled the result is also persisted in the background;
    /// the output is returned without waiting for that write.
    pub fn run(
        &self,
        ctx: &mut dyn LoaderContext,
        source: &str,
        data: &RequestData,
    ) -> Result<LoaderOutput, LoaderError> {
        ctx.set_cacheable(true);
        let runtime = self.runtime()?;
        let file = ctx.resource_path().to_string_lossy().into_owned();

        let (newly_registered, compiled) = {
            let mut session = runtime.session.lock();
            let newly_registered = !session.registry().contains(&file);
            (newly_registered, session.compile(&file, source))
        };
        // A file stays registered even when its first compile fails.
        if newly_registered {
            if let Err(err) = runtime.watcher.watch(&file) {
                tracing::warn!(file = %file, "{err}");
            }
        }
        let compiled = compiled?;

        let mut reported = Vec::with_capacity(compiled.diagnostics.len());
        for message in &compiled.diagnostics {
            let formatted = runtime.formatter.format(message);
            report(ctx, formatted.clone());
            reported.push(formatted);
        }

        let output = LoaderOutput {
            content: compiled.content,
            source_map: compiled.source_map,
        };
        if let Some(store) = &self.store {
            self.store_result(ctx, store, data, reported, &output);
        }
        Ok(output)
    }

    /// Runs both phases for one module, the way a host would.
    pub fn load(
        &self,
        ctx: &mut dyn LoaderContext,
        remaining_request: &str,
        source: &str,
    ) -> Result<LoaderOutput, LoaderError> {
        let mut data = RequestData::new();
        match self.pitch(ctx, remaining_request, &mut data) {
            PitchOutcome::Cached(output) => Ok(output),
            PitchOutcome::Continue => self.run(ctx, source, &data),
        }
    }

    fn store_result(
        &self,
        ctx: &dyn LoaderContext,
        store: &Arc<dyn CacheStore>,
        data: &RequestData,
        diagnostics: Vec<ReportedMessage>,
        output: &LoaderOutput,
    ) {
        let (Some(key), Some(start_time)) = (&data.cache_key, data.start_time) else {
            tracing::debug!("no pitch decision for this request, not caching");
            return;
        };

        let mut dependencies = ctx.dependencies();
        dependencies.extend(ctx.loader_paths());
        let context_dependencies = ctx.context_dependencies();

        let statter = DependencyStatter::new(&self.pool);
        let (dependencies, context_dependencies) = match (
            statter.record(&dependencies),
            statter.record(&context_dependencies),
        ) {
            (Ok(deps), Ok(context_deps)) => (deps, context_deps),
            (Err(err), _) | (_, Err(err)) => {
                tracing::debug!("not caching: {err}");
                return;
            }
        };
        if let Some(record) = first_in_flux(&dependencies, start_time)
            .or_else(|| first_in_flux(&context_dependencies, start_time))
        {
            tracing::debug!(
                path = %record.path.display(),
                mtime = %record.mtime,
                start = %start_time,
                "not caching: dependency still in flux"
            );
            return;
        }

        let entry = CacheEntry {
            diagnostics,
            dependencies,
            context_dependencies,
            remaining_request: data.remaining_request.clone().unwrap_or_default(),
            result: (output.content.clone(), output.source_map.clone()),
        };
        let guard = self.writes.begin();
        let store = Arc::clone(store);
        let key = key.clone();
        self.pool.spawn(move || {
            let _guard = guard;
            match store.write(&key, &entry) {
                Ok(()) => tracing::debug!(key = %key, "cache entry written"),
                Err(err) => tracing::warn!(key = %key, "cache write failed: {err}"),
            }
        });
    }

    fn runtime(&self) -> Result<&Runtime, LoaderError> {
        self.runtime
            .get_or_init(|| self.start_runtime())
            .as_ref()
            .map_err(Clone::clone)
    }

    fn start_runtime(&self) -> Result<Runtime, LoaderError> {
        let compiler_options = setup_compiler_options(&self.options, &self.cwd, LOADER_NAME)?;
        let mut builder = Session::builder(Arc::clone(&self.compiler), compiler_options)
            .cwd(&self.cwd)
            .transformers(Arc::clone(&self.transformers));
        let mut formatter: Box<dyn DiagnosticFormatter> = Box::new(DefaultFormatter);

        if let Some(tslint) = &self.options.tslint {
            let linter = self.linter.clone().ok_or_else(|| ConfigError::InvalidOptions {
                loader: LOADER_NAME.to_string(),
                reason: "`tslint` is set but no linter is available".to_string(),
            })?;
            if let Some(name) = &self.options.tslint_formatter {
                match linter.find_formatter(name) {
                    Some(lint_formatter) => {
                        formatter = Box::new(LintAdapterFormatter::new(lint_formatter));
                    }
                    None => tracing::warn!(name = %name, "unknown lint formatter, using the default"),
                }
            }
            builder = builder.lint(linter, self.cwd.join(tslint));
        }

        let session = builder.build()?.into_shared();
        Ok(Runtime {
            watcher: WatchScheduler::new(Arc::clone(&session)),
            session,
            formatter,
        })
    }
}

fn report(ctx: &mut dyn LoaderContext, message: ReportedMessage) {
    if message.severity == Severity::Error {
        ctx.emit_error(message.message);
    } else {
        ctx.emit_warning(message.message);
    }
}
