//! Tracking of cache writes still in progress.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// Counts detached cache writes so callers can wait for them to land.
#[derive(Debug, Default)]
pub struct PendingWrites {
    count: Mutex<usize>,
    idle: Condvar,
}

impl PendingWrites {
    /// Creates a counter with nothing in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a write; it is finished when the returned guard drops.
    pub fn begin(self: &Arc<Self>) -> WriteGuard {
        *self.count.lock() += 1;
        WriteGuard(Arc::clone(self))
    }

    /// Number of writes not yet finished.
    pub fn in_flight(&self) -> usize {
        *self.count.lock()
    }

    /// Blocks until every registered write has finished.
    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.idle.wait(&mut count);
        }
    }

    fn finish(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }
}

/// Marks one write as finished on drop, even if the write panicked.
#[derive(Debug)]
pub struct WriteGuard(Arc<PendingWrites>);

impl Drop for WriteGuard {
    fn drop(&mut self) {
        self.0.finish();
    }
}
