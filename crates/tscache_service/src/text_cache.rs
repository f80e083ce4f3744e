//! Read-through cache of file contents.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Caches file text by path for the lifetime of the process.
///
/// Unreadable files are cached as `None` too, so the disk is consulted at
/// most once per path.
#[derive(Debug, Default)]
pub struct SourceTextCache {
    texts: Mutex<HashMap<String, Option<Arc<str>>>>,
}

impl SourceTextCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the text of `file_name`, reading it from disk on first use.
    pub fn read(&self, file_name: &str) -> Option<Arc<str>> {
        let mut texts = self.texts.lock();
        if let Some(text) = texts.get(file_name) {
            tracing::trace!(file_name, "text cache hit");
            return text.clone();
        }
        let text = std::fs::read_to_string(file_name).ok().map(Arc::from);
        texts.insert(file_name.to_string(), text.clone());
        text
    }

    /// Number of cached paths.
    pub fn len(&self) -> usize {
        self.texts.lock().len()
    }

    /// Returns `true` if nothing has been read yet.
    pub fn is_empty(&self) -> bool {
        self.texts.lock().is_empty()
    }
}
