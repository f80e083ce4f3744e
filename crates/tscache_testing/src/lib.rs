//! Test doubles for the compiler, the lint library and the build host.
//!
//! [`FakeCompiler`] is a toy type-stripping compiler with just enough type
//! checking to produce deterministic diagnostics. [`RecordingContext`]
//! records everything the loader tells the host.

#![warn(missing_docs)]

pub mod compiler;
pub mod context;
pub mod linter;

pub use compiler::{CompilerCounters, FakeCompiler};
pub use context::RecordingContext;
pub use linter::{FakeLinter, ProseFormatter};

use std::fs::File;
use std::path::Path;
use tscache_common::Mtime;

/// Installs a `RUST_LOG`-driven subscriber for the current test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Writes `content` to `path` and pins its modification time.
pub fn write_file(path: &Path, content: &str, mtime: Mtime) {
    std::fs::write(path, content).unwrap();
    set_mtime(path, mtime);
}

/// Pins the modification time of an existing file or directory.
pub fn set_mtime(path: &Path, mtime: Mtime) {
    let file = File::open(path).unwrap();
    file.set_modified(mtime.to_system_time()).unwrap();
}
