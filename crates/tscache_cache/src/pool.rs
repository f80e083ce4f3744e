//! Bounded worker pool for cache I/O.

use rayon::prelude::*;
use rayon::ThreadPool;

/// Maximum number of simultaneous in-flight stats and writes.
pub const MAX_IN_FLIGHT: usize = 20;

/// A fixed-size pool for stats and cache writes.
///
/// Falls back to running jobs on the calling thread when no worker threads
/// can be created.
pub enum IoPool {
    /// Jobs run on a dedicated rayon pool.
    Rayon(ThreadPool),
    /// Jobs run inline on the caller.
    Inline,
}

impl IoPool {
    /// Builds a pool of at most `threads` workers, halving on failure.
    pub fn new(threads: usize) -> Self {
        let mut threads = threads.max(1);
        loop {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|idx| format!("tscache-io-{idx}"))
                .build()
            {
                Ok(pool) => return IoPool::Rayon(pool),
                Err(_) if threads > 1 => threads = (threads / 2).max(1),
                Err(err) => {
                    tracing::warn!("cannot start cache I/O threads, running inline: {err}");
                    return IoPool::Inline;
                }
            }
        }
    }

    /// Runs a detached job.
    pub fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            IoPool::Rayon(pool) => pool.spawn(job),
            IoPool::Inline => job(),
        }
    }

    /// Applies `f` to every item and returns all results in input order.
    ///
    /// Returns only once every item has been processed.
    pub fn map_all<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        match self {
            IoPool::Rayon(pool) => pool.install(|| items.par_iter().map(&f).collect()),
            IoPool::Inline => items.iter().map(f).collect(),
        }
    }
}

impl Default for IoPool {
    fn default() -> Self {
        Self::new(MAX_IN_FLIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};

    #[test]
    fn map_all_preserves_order() {
        let pool = IoPool::new(4);
        let items: Vec<u32> = (0..100).collect();
        let doubled = pool.map_all(&items, |n| n * 2);
        assert_eq!(doubled, (0..100).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn inline_runs_on_caller() {
        let pool = IoPool::Inline;
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        pool.spawn(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(pool.map_all(&[1, 2, 3], |n| n + 1), vec![2, 3, 4]);
    }

    #[test]
    fn spawned_job_runs() {
        let pool = IoPool::new(2);
        let (tx, rx) = mpsc::channel();
        pool.spawn(move || tx.send(42).unwrap());
        assert_eq!(rx.recv().unwrap(), 42);
    }
}
