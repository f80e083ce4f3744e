//! The compiler-service adapter and everything that keeps it warm.
//!
//! A [`Session`] owns the single incremental language service of the process
//! together with the [`FileRegistry`] it reads versions from and the
//! process-lifetime module-resolution and source-text caches. The
//! [`WatchScheduler`] polls registered files and re-emits them in the
//! background so the next build finds their output ready.
//!
//! The compiler itself is a collaborator reached through the traits in
//! [`compiler`].

#![warn(missing_docs)]

pub mod compiler;
pub mod error;
pub mod host;
pub mod lint;
pub mod registry;
pub mod resolution;
pub mod session;
pub mod text_cache;
pub mod watch;

pub use compiler::{
    Compiler, CustomTransformers, EmitOutput, LanguageService, LanguageServiceHost, LintProvider,
    Linter, ModuleResolutionHost, OutputFile, ResolvedModule, TranspileOutput, TranspileRequest,
    TransformersFactory,
};
pub use error::ServiceError;
pub use host::{DiskHost, InFlight, ServiceHost};
pub use lint::LintedService;
pub use registry::{FileRegistry, RegistryEntry};
pub use resolution::ModuleResolutionCache;
pub use session::{collect_diagnostics, CompiledFile, Session, SessionBuilder, SharedSession};
pub use text_cache::SourceTextCache;
pub use watch::{WatchOutcome, WatchScheduler, WATCH_INTERVAL};
