//! Recording and validating dependency modification times.

use std::path::{Path, PathBuf};
use tscache_common::Mtime;

use crate::entry::DependencyRecord;
use crate::error::CacheError;
use crate::pool::IoPool;

fn stat(path: &Path) -> Result<DependencyRecord, CacheError> {
    let mtime = Mtime::of_path(path).map_err(|e| CacheError::Stat {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::trace!(path = %path.display(), %mtime, "stat dependency");
    Ok(DependencyRecord {
        path: path.to_path_buf(),
        mtime,
    })
}

/// Stats dependency batches on an [`IoPool`].
///
/// Every batch is awaited in full before a result is returned, even when an
/// early item already failed.
pub struct DependencyStatter<'a> {
    pool: &'a IoPool,
}

impl<'a> DependencyStatter<'a> {
    /// Creates a statter that runs on `pool`.
    pub fn new(pool: &'a IoPool) -> Self {
        Self { pool }
    }

    /// Stats every path, returning one result per path in input order.
    pub fn stat_all(&self, paths: &[PathBuf]) -> Vec<Result<DependencyRecord, CacheError>> {
        self.pool.map_all(paths, |path| stat(path))
    }

    /// Records the current modification time of every path.
    ///
    /// Fails with the first error in input order if any path cannot be stat'ed.
    pub fn record(&self, paths: &[PathBuf]) -> Result<Vec<DependencyRecord>, CacheError> {
        self.stat_all(paths).into_iter().collect()
    }

    /// Checks that every record still matches the file on disk.
    ///
    /// Fails with the first stat error or mismatch in input order.
    pub fn validate<'r, I>(&self, records: I) -> Result<(), CacheError>
    where
        I: IntoIterator<Item = &'r DependencyRecord>,
    {
        let records: Vec<&DependencyRecord> = records.into_iter().collect();
        let outcomes = self.pool.map_all(&records, |record| {
            let current = stat(&record.path)?;
            if current.mtime == record.mtime {
                Ok(())
            } else {
                Err(CacheError::MtimeMismatch {
                    path: record.path.clone(),
                    recorded: record.mtime,
                    current: current.mtime,
                })
            }
        });
        outcomes.into_iter().collect()
    }
}

/// Returns the first record modified at or after `start`, if any.
pub fn first_in_flux(records: &[DependencyRecord], start: Mtime) -> Option<&DependencyRecord> {
    records.iter().find(|record| record.mtime >= start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn file_at(dir: &Path, name: &str, millis: u64) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(Mtime::from_millis(millis).to_system_time())
            .unwrap();
        path
    }

    #[test]
    fn record_reads_mtimes_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = file_at(dir.path(), "a.ts", 1_000_000);
        let b = file_at(dir.path(), "b.ts", 2_000_000);
        let pool = IoPool::new(4);
        let records = DependencyStatter::new(&pool)
            .record(&[a.clone(), b.clone()])
            .unwrap();
        assert_eq!(records[0], DependencyRecord { path: a, mtime: Mtime::from_millis(1_000_000) });
        assert_eq!(records[1], DependencyRecord { path: b, mtime: Mtime::from_millis(2_000_000) });
    }

    #[test]
    fn record_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = file_at(dir.path(), "a.ts", 1_000_000);
        let pool = IoPool::Inline;
        let err = DependencyStatter::new(&pool)
            .record(&[a, dir.path().join("gone.ts")])
            .unwrap_err();
        assert!(matches!(err, CacheError::Stat { .. }));
    }

    #[test]
    fn validate_accepts_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let a = file_at(dir.path(), "a.ts", 1_000_000);
        let pool = IoPool::new(2);
        let statter = DependencyStatter::new(&pool);
        let records = statter.record(&[a]).unwrap();
        assert!(statter.validate(&records).is_ok());
    }

    #[test]
    fn validate_rejects_touched_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = file_at(dir.path(), "a.ts", 1_000_000);
        let b = file_at(dir.path(), "b.ts", 1_000_000);
        let pool = IoPool::new(2);
        let statter = DependencyStatter::new(&pool);
        let records = statter.record(&[a, b.clone()]).unwrap();

        file_at(dir.path(), "b.ts", 1_000_500);
        match statter.validate(&records) {
            Err(CacheError::MtimeMismatch { path, recorded, current }) => {
                assert_eq!(path, b);
                assert_eq!(recorded, Mtime::from_millis(1_000_000));
                assert_eq!(current, Mtime::from_millis(1_000_500));
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_deleted_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = file_at(dir.path(), "a.ts", 1_000_000);
        let pool = IoPool::Inline;
        let statter = DependencyStatter::new(&pool);
        let records = statter.record(&[a.clone()]).unwrap();
        std::fs::remove_file(&a).unwrap();
        assert!(matches!(statter.validate(&records), Err(CacheError::Stat { .. })));
    }

    #[test]
    fn in_flux_is_inclusive_of_start() {
        let records = vec![
            DependencyRecord { path: "a".into(), mtime: Mtime::from_millis(999) },
            DependencyRecord { path: "b".into(), mtime: Mtime::from_millis(1000) },
        ];
        let hit = first_in_flux(&records, Mtime::from_millis(1000)).unwrap();
        assert_eq!(hit.path, PathBuf::from("b"));
        assert!(first_in_flux(&records, Mtime::from_millis(1001)).is_none());
    }
}
