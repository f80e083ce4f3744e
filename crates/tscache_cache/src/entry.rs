//! The persisted cache entry.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tscache_common::Mtime;
use tscache_diagnostics::ReportedMessage;
use tscache_source::SourceMap;

use crate::error::CacheError;

/// A dependency path together with the modification time it had when the
/// entry was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Absolute path of the dependency.
    pub path: PathBuf,
    /// Modification time observed when the entry was written.
    pub mtime: Mtime,
}

/// One compiled module as stored on disk.
///
/// Serialized as a single JSON object per cache file:
/// `{diagnostics, dependencies, contextDependencies, remainingRequest, result}`
/// where `result` is the `[content, sourceMap]` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Formatted diagnostics, replayed on a hit.
    pub diagnostics: Vec<ReportedMessage>,
    /// File dependencies, including the loader chain.
    pub dependencies: Vec<DependencyRecord>,
    /// Directory dependencies.
    pub context_dependencies: Vec<DependencyRecord>,
    /// The request string the entry was written for.
    pub remaining_request: String,
    /// Emitted content and its source map.
    pub result: (String, SourceMap),
}

impl CacheEntry {
    /// Checks that the entry was written for `request`.
    pub fn check_request(&self, request: &str) -> Result<(), CacheError> {
        if self.remaining_request == request {
            Ok(())
        } else {
            Err(CacheError::RequestMismatch {
                stored: self.remaining_request.clone(),
                requested: request.to_string(),
            })
        }
    }

    /// Every recorded dependency and context dependency.
    pub fn all_dependencies(&self) -> impl Iterator<Item = &DependencyRecord> {
        self.dependencies.iter().chain(&self.context_dependencies)
    }
}
