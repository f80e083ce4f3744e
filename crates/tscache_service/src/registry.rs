//! Versioned registry of every file the service has seen.

use std::collections::HashMap;
use tscache_common::ContentHash;
use tscache_diagnostics::DiagnosticMessage;
use tscache_source::SourceMap;

/// Compiled state of one file.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    /// Bumped on every compile; never decreases.
    pub version: u32,
    /// Emitted code, present while `emitted` is set.
    pub content: Option<String>,
    /// Source map bound to this file, present while `emitted` is set.
    pub source_map: Option<SourceMap>,
    /// Whether `content` and `source_map` match the current version.
    pub emitted: bool,
    /// Digest of the source text the held output was produced from.
    pub source_hash: Option<ContentHash>,
    /// Diagnostics of the most recent compile.
    pub diagnostics: Vec<DiagnosticMessage>,
}

impl RegistryEntry {
    fn new() -> Self {
        Self {
            version: 1,
            content: None,
            source_map: None,
            emitted: false,
            source_hash: None,
            diagnostics: Vec::new(),
        }
    }
}

/// Maps file names to their [`RegistryEntry`].
///
/// Entries are never removed: the compiler expects a stable universe of
/// script files. The order of registration is kept and exposed to the
/// compiler as its file list.
#[derive(Debug, Default)]
pub struct FileRegistry {
    entries: HashMap<String, RegistryEntry>,
    order: Vec<String>,
}

impl FileRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `file` at version 1. Returns `false` if it was already present.
    pub fn register(&mut self, file: &str) -> bool {
        if self.entries.contains_key(file) {
            return false;
        }
        self.entries.insert(file.to_string(), RegistryEntry::new());
        self.order.push(file.to_string());
        tracing::debug!(file, "registered");
        true
    }

    /// Returns `true` if `file` has been registered.
    pub fn contains(&self, file: &str) -> bool {
        self.entries.contains_key(file)
    }

    /// The entry for `file`.
    pub fn get(&self, file: &str) -> Option<&RegistryEntry> {
        self.entries.get(file)
    }

    /// The current version of `file`.
    pub fn version(&self, file: &str) -> Option<u32> {
        self.entries.get(file).map(|e| e.version)
    }

    /// Returns `true` if `file` holds output for its current version.
    pub fn is_emitted(&self, file: &str) -> bool {
        self.entries.get(file).is_some_and(|e| e.emitted)
    }

    /// Returns `true` if `file` holds output produced from source text with
    /// digest `source_hash`.
    pub fn is_emitted_from(&self, file: &str, source_hash: ContentHash) -> bool {
        self.entries
            .get(file)
            .is_some_and(|e| e.emitted && e.source_hash == Some(source_hash))
    }

    /// Increments the version of `file` and returns the new one.
    pub fn bump(&mut self, file: &str) -> Option<u32> {
        let entry = self.entries.get_mut(file)?;
        entry.version += 1;
        Some(entry.version)
    }

    /// Stores fresh output for `file`, produced from source text with digest
    /// `source_hash`, and marks it emitted.
    pub fn set_output(
        &mut self,
        file: &str,
        source_hash: ContentHash,
        content: String,
        source_map: SourceMap,
        diagnostics: Vec<DiagnosticMessage>,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(file) else {
            return false;
        };
        entry.source_hash = Some(source_hash);
        entry.content = Some(content);
        entry.source_map = Some(source_map);
        entry.diagnostics = diagnostics;
        entry.emitted = true;
        true
    }

    /// Drops the output of `file` and marks it as not emitted.
    pub fn clear(&mut self, file: &str) {
        if let Some(entry) = self.entries.get_mut(file) {
            entry.content = None;
            entry.source_map = None;
            entry.source_hash = None;
            entry.emitted = false;
        }
    }

    /// Moves the output of `file` out of the registry, leaving it cleared.
    pub fn take(&mut self, file: &str) -> Option<(String, SourceMap)> {
        let entry = self.entries.get_mut(file)?;
        let output = entry.content.take().zip(entry.source_map.take());
        entry.source_hash = None;
        entry.emitted = false;
        output
    }

    /// Registered file names in registration order.
    pub fn file_names(&self) -> &[String] {
        &self.order
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
