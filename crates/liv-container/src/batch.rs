//! Parallel file hashing over a fixed worker pool.
//!
//! Paths are fed through a bounded job queue to `workers` scoped threads that
//! share one [`ContentHasher`] (and therefore one cache). The call blocks until
//! every path has produced a digest or an error. Failures do not cancel the
//! batch; successful digests are returned alongside them.

use crate::digest::{ContentHasher, Digest};
use crate::error::{BatchHashError, HashError};
use crossbeam_channel::{bounded, unbounded};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Worker count used when zero is requested.
pub const DEFAULT_WORKERS: usize = 4;

/// Batch hasher with bounded parallelism.
#[derive(Debug, Clone)]
pub struct BatchHasher {
    hasher: ContentHasher,
    workers: usize,
}

impl BatchHasher {
    pub fn new(hasher: ContentHasher, workers: usize) -> Self {
        let workers = if workers == 0 { DEFAULT_WORKERS } else { workers };
        Self { hasher, workers }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn hasher(&self) -> &ContentHasher {
        &self.hasher
    }

    /// Hash every path, returning a complete path -> digest map.
    pub fn hash_files(&self, paths: &[PathBuf]) -> Result<BTreeMap<PathBuf, Digest>, BatchHashError> {
        let outcomes = self.run(paths);

        let mut partial = BTreeMap::new();
        let mut failures = Vec::new();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(digest) => {
                    partial.insert(path, digest);
                }
                Err(e) => failures.push(e),
            }
        }

        tracing::debug!(
            hashed = partial.len(),
            failed = failures.len(),
            workers = self.workers,
            "batch hash finished"
        );

        if failures.is_empty() {
            Ok(partial)
        } else {
            failures.sort_by(|a, b| a.path.cmp(&b.path));
            Err(BatchHashError { partial, failures })
        }
    }

    /// Hash every regular file under `root`, keyed by forward-slash relative path.
    ///
    /// On failure `partial` uses the same relative keys; failure paths stay as
    /// walked so they can be opened.
    pub fn hash_directory(&self, root: &Path) -> Result<BTreeMap<String, Digest>, BatchHashError> {
        let mut files = Vec::new();
        let mut walk_failures = Vec::new();
        for entry in walkdir::WalkDir::new(root).follow_links(false) {
            match entry {
                Ok(e) if e.file_type().is_file() => files.push(e.into_path()),
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    walk_failures.push(HashError {
                        path,
                        source: e.into(),
                    });
                }
            }
        }

        let (digests, mut failures) = match self.hash_files(&files) {
            Ok(d) => (d, Vec::new()),
            Err(e) => (e.partial, e.failures),
        };
        failures.extend(walk_failures);

        let relative = relative_keys(root, digests);
        if !failures.is_empty() {
            return Err(BatchHashError {
                partial: relative
                    .into_iter()
                    .map(|(rel, digest)| (PathBuf::from(rel), digest))
                    .collect(),
                failures,
            });
        }
        Ok(relative)
    }

    fn run(&self, paths: &[PathBuf]) -> Vec<(PathBuf, Result<Digest, HashError>)> {
        if paths.is_empty() {
            return Vec::new();
        }

        std::thread::scope(|scope| {
            let (job_tx, job_rx) = bounded::<&Path>(self.workers * 2);
            let (result_tx, result_rx) = unbounded();

            for _ in 0..self.workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let hasher = &self.hasher;
                scope.spawn(move || {
                    for path in job_rx {
                        let outcome = hasher.digest_of_file(path);
                        if result_tx.send((path.to_path_buf(), outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(job_rx);
            drop(result_tx);

            // Blocks while the queue is full.
            for path in paths {
                if job_tx.send(path.as_path()).is_err() {
                    break;
                }
            }
            drop(job_tx);

            result_rx.into_iter().collect()
        })
    }
}

impl Default for BatchHasher {
    fn default() -> Self {
        Self::new(ContentHasher::default(), DEFAULT_WORKERS)
    }
}

fn relative_keys(root: &Path, digests: BTreeMap<PathBuf, Digest>) -> BTreeMap<String, Digest> {
    digests
        .into_iter()
        .map(|(path, digest)| (relative_slash_path(root, &path), digest))
        .collect()
}

pub(crate) fn relative_slash_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{digest, SharedHashCache};
    use std::sync::Arc;

    fn write_files(dir: &Path, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let p = dir.join(format!("file-{i:03}.txt"));
                std::fs::write(&p, format!("content {i}")).unwrap();
                p
            })
            .collect()
    }

    #[test]
    fn hashes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_files(dir.path(), 37);

        let batch = BatchHasher::new(ContentHasher::uncached(), 4);
        let result = batch.hash_files(&paths).unwrap();

        assert_eq!(result.len(), 37);
        for (i, p) in paths.iter().enumerate() {
            assert_eq!(result[p], digest(format!("content {i}").as_bytes()));
        }
    }

    #[test]
    fn zero_workers_falls_back_to_default() {
        let batch = BatchHasher::new(ContentHasher::uncached(), 0);
        assert_eq!(batch.workers(), DEFAULT_WORKERS);
    }

    #[test]
    fn partial_results_survive_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = write_files(dir.path(), 5);
        let missing = dir.path().join("missing.bin");
        paths.push(missing.clone());

        let batch = BatchHasher::new(ContentHasher::uncached(), 3);
        let err = batch.hash_files(&paths).unwrap_err();

        assert_eq!(err.partial.len(), 5);
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].path, missing);
        assert!(err.to_string().contains("missing.bin"));
    }

    #[test]
    fn shared_cache_is_filled_by_workers() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_files(dir.path(), 10);

        let cache = Arc::new(SharedHashCache::new());
        let batch = BatchHasher::new(ContentHasher::new(cache.clone()), 4);
        batch.hash_files(&paths).unwrap();

        assert_eq!(crate::digest::HashCache::len(cache.as_ref()), 10);
    }

    #[test]
    fn directory_keys_are_relative() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("content/styles")).unwrap();
        std::fs::write(dir.path().join("manifest.json"), b"{}").unwrap();
        std::fs::write(dir.path().join("content/styles/main.css"), b"body{}").unwrap();

        let batch = BatchHasher::default();
        let result = batch.hash_directory(dir.path()).unwrap();

        let keys: Vec<_> = result.keys().cloned().collect();
        assert_eq!(keys, vec!["content/styles/main.css", "manifest.json"]);
        assert_eq!(result["manifest.json"], digest(b"{}"));
    }

    #[test]
    fn relative_keys_match_on_success_and_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets/data")).unwrap();
        std::fs::write(dir.path().join("assets/data/t.csv"), b"a,b").unwrap();
        let ok = BatchHasher::default().hash_directory(dir.path()).unwrap();

        let mut absolute = BTreeMap::new();
        absolute.insert(dir.path().join("assets/data/t.csv"), digest(b"a,b"));
        let rekeyed = relative_keys(dir.path(), absolute);

        assert_eq!(rekeyed, ok);
        assert_eq!(rekeyed.keys().collect::<Vec<_>>(), vec!["assets/data/t.csv"]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        let batch = BatchHasher::default();
        assert!(batch.hash_files(&[]).unwrap().is_empty());
    }
}
