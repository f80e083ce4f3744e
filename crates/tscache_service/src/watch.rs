//! Background re-emission of changed files.
//!
//! Every registered file is polled for modification-time changes. When a
//! file's mtime advances and the registry holds no output for its new text,
//! the file is re-emitted through the language service so the next build request
//! finds it ready. The polling backend only feeds [`WatchScheduler::on_change`],
//! which holds all of the decision logic.

use notify::{Config, Event, PollWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tscache_common::Mtime;

use crate::error::ServiceError;
use crate::session::SharedSession;

/// How often watched files are polled.
pub const WATCH_INTERVAL: Duration = Duration::from_millis(10);

/// What a change notification led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The path is not being watched.
    Untracked,
    /// The mtime did not advance past the last one seen.
    Stale,
    /// The file still holds unconsumed output for its current text.
    AlreadyEmitted,
    /// The file was re-emitted.
    Transpiled,
    /// Re-emission failed; the next build request will retry inline.
    Failed,
}

struct Tracked {
    file: String,
    last_mtime: Mtime,
}

struct WatchState {
    session: SharedSession,
    tracked: Mutex<HashMap<PathBuf, Tracked>>,
}

impl WatchState {
    fn on_change(&self, path: &Path, mtime: Mtime) -> WatchOutcome {
        let file = {
            let mut tracked = self.tracked.lock();
            let Some(entry) = tracked.get_mut(path) else {
                return WatchOutcome::Untracked;
            };
            if mtime <= entry.last_mtime {
                return WatchOutcome::Stale;
            }
            entry.last_mtime = mtime;
            entry.file.clone()
        };

        let mut session = self.session.lock();
        if session.is_current(&file) {
            return WatchOutcome::AlreadyEmitted;
        }
        match session.emit_via_service(&file) {
            Ok(()) => {
                tracing::debug!(file = %file, %mtime, "re-emitted after change");
                WatchOutcome::Transpiled
            }
            Err(err) => {
                tracing::warn!(file = %file, "background re-emit failed: {err}");
                WatchOutcome::Failed
            }
        }
    }
}

/// Watches registered files and re-emits them when they change.
pub struct WatchScheduler {
    state: Arc<WatchState>,
    backend: Mutex<Option<PollWatcher>>,
}

impl WatchScheduler {
    /// Creates a scheduler for `session`. The polling thread starts with the
    /// first [`watch`](Self::watch).
    pub fn new(session: SharedSession) -> Self {
        Self {
            state: Arc::new(WatchState {
                session,
                tracked: Mutex::new(HashMap::new()),
            }),
            backend: Mutex::new(None),
        }
    }

    /// Starts tracking `file` without polling it. Returns `false` if it was
    /// already tracked.
    ///
    /// The current mtime becomes the baseline; a file not yet on disk starts
    /// at zero.
    pub fn track(&self, file: &str) -> bool {
        let path = PathBuf::from(file);
        let mut tracked = self.state.tracked.lock();
        if tracked.contains_key(&path) {
            return false;
        }
        let last_mtime = Mtime::of_path(&path).unwrap_or(Mtime::from_millis(0));
        tracked.insert(
            path,
            Tracked {
                file: file.to_string(),
                last_mtime,
            },
        );
        true
    }

    /// Tracks `file` and polls it every [`WATCH_INTERVAL`].
    ///
    /// Must not be called while holding the session lock: the polling
    /// thread takes that lock when it reports a change.
    pub fn watch(&self, file: &str) -> Result<(), ServiceError> {
        if !self.track(file) {
            return Ok(());
        }
        let watch_error = |reason: String| ServiceError::Watch {
            path: PathBuf::from(file),
            reason,
        };

        let mut backend = self.backend.lock();
        if backend.is_none() {
            *backend = Some(self.start_backend().map_err(|e| watch_error(e.to_string()))?);
        }
        if let Some(watcher) = backend.as_mut() {
            watcher
                .watch(Path::new(file), RecursiveMode::NonRecursive)
                .map_err(|e| watch_error(e.to_string()))?;
        }
        tracing::debug!(file, "watching");
        Ok(())
    }

    /// Reports that `path` now has modification time `mtime`.
    pub fn on_change(&self, path: &Path, mtime: Mtime) -> WatchOutcome {
        self.state.on_change(path, mtime)
    }

    /// Returns `true` if `file` is tracked.
    pub fn is_tracked(&self, file: &str) -> bool {
        self.state.tracked.lock().contains_key(Path::new(file))
    }

    fn start_backend(&self) -> notify::Result<PollWatcher> {
        let state = Arc::clone(&self.state);
        let config = Config::default().with_poll_interval(WATCH_INTERVAL);
        PollWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for path in &event.paths {
                        // Removed files have no mtime; they keep their last output.
                        if let Ok(mtime) = Mtime::of_path(path) {
                            state.on_change(path, mtime);
                        }
                    }
                }
                Err(err) => tracing::warn!("file watcher error: {err}"),
            },
            config,
        )
    }
}
