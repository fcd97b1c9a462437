//! Content digests (SHA-256, lower-case hex).
//!
//! Pure helpers hash bytes and streams. [`ContentHasher`] adds file hashing
//! behind a [`HashCache`]. The cache is keyed by path only, not by mtime: a
//! file rewritten at the same path keeps its old digest until the cache is
//! cleared.

use crate::error::HashError;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Hex-encoded SHA-256 of some content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a declared digest.
    pub fn matches(&self, expected: &str) -> bool {
        self.0.eq_ignore_ascii_case(expected)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Digest of an in-memory byte slice.
pub fn digest(bytes: &[u8]) -> Digest {
    Digest(hex::encode(Sha256::digest(bytes)))
}

/// Digest of everything remaining in `reader`.
pub fn digest_of_stream<R: Read>(mut reader: R) -> std::io::Result<Digest> {
    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(Digest(hex::encode(hasher.finalize())))
}

/// Digest of every entry in a collection, keyed by the same path.
pub fn digest_map(content: &crate::NamedContent) -> BTreeMap<String, Digest> {
    content
        .iter()
        .map(|(path, bytes)| (path.clone(), digest(bytes)))
        .collect()
}

/// Whether `bytes` hash to `expected` (case-insensitive).
pub fn verify_bytes(bytes: &[u8], expected: &str) -> bool {
    digest(bytes).matches(expected)
}

/// Whether the rest of `reader` hashes to `expected` (case-insensitive).
pub fn verify_stream<R: Read>(reader: R, expected: &str) -> std::io::Result<bool> {
    Ok(digest_of_stream(reader)?.matches(expected))
}

/// Path-keyed digest cache.
///
/// Implementations are shared across batch-hashing workers, so reads may be
/// concurrent and writes must be exclusive.
pub trait HashCache: Send + Sync {
    fn get(&self, path: &Path) -> Option<Digest>;
    fn insert(&self, path: PathBuf, digest: Digest);
    fn clear(&self);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reader/writer-locked in-memory cache.
#[derive(Debug, Default)]
pub struct SharedHashCache {
    entries: RwLock<HashMap<PathBuf, Digest>>,
}

impl SharedHashCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashCache for SharedHashCache {
    fn get(&self, path: &Path) -> Option<Digest> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    fn insert(&self, path: PathBuf, digest: Digest) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, digest);
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl HashCache for NoCache {
    fn get(&self, _path: &Path) -> Option<Digest> {
        None
    }

    fn insert(&self, _path: PathBuf, _digest: Digest) {}

    fn clear(&self) {}

    fn len(&self) -> usize {
        0
    }
}

/// File hasher with a pluggable cache.
#[derive(Clone)]
pub struct ContentHasher {
    cache: Arc<dyn HashCache>,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(Arc::new(SharedHashCache::new()))
    }
}

impl fmt::Debug for ContentHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentHasher")
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl ContentHasher {
    pub fn new(cache: Arc<dyn HashCache>) -> Self {
        Self { cache }
    }

    /// Hasher that always reads from disk.
    pub fn uncached() -> Self {
        Self::new(Arc::new(NoCache))
    }

    pub fn cache(&self) -> &dyn HashCache {
        self.cache.as_ref()
    }

    /// Digest of the file at `path`, served from the cache when present.
    pub fn digest_of_file(&self, path: &Path) -> Result<Digest, HashError> {
        if let Some(cached) = self.cache.get(path) {
            tracing::debug!(path = %path.display(), "digest cache hit");
            return Ok(cached);
        }

        let file = std::fs::File::open(path).map_err(|source| HashError {
            path: path.to_path_buf(),
            source,
        })?;
        let digest = digest_of_stream(file).map_err(|source| HashError {
            path: path.to_path_buf(),
            source,
        })?;

        self.cache.insert(path.to_path_buf(), digest.clone());
        Ok(digest)
    }

    /// Whether the file at `path` hashes to `expected` (case-insensitive).
    pub fn verify_file(&self, path: &Path, expected: &str) -> Result<bool, HashError> {
        Ok(self.digest_of_file(path)?.matches(expected))
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct ChunkedReader<'a> {
        data: &'a [u8],
        pos: usize,
        max_chunk: usize,
    }

    impl Read for ChunkedReader<'_> {
        fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.data.len() {
                return Ok(0);
            }
            let n = out
                .len()
                .min(self.max_chunk)
                .min(self.data.len().saturating_sub(self.pos));
            out[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn known_vector() {
        assert_eq!(
            digest(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            digest(b"abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn repeatable_and_distinct() {
        assert_eq!(digest(b"hello"), digest(b"hello"));
        assert_ne!(digest(b"hello"), digest(b"hello "));
        assert_ne!(digest(b"\x00"), digest(b""));
    }

    #[test]
    fn stream_matches_bytes_with_small_chunks() {
        let payload = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let chunked = ChunkedReader {
            data: payload,
            pos: 0,
            max_chunk: 3,
        };
        assert_eq!(digest_of_stream(chunked).unwrap(), digest(payload));
        assert_eq!(
            digest_of_stream(Cursor::new(payload)).unwrap(),
            digest(payload)
        );
    }

    #[test]
    fn verify_is_case_insensitive() {
        let upper = digest(b"abc").as_str().to_ascii_uppercase();
        assert!(verify_bytes(b"abc", &upper));
        assert!(!verify_bytes(b"abd", &upper));
        assert!(!verify_bytes(b"abc", &format!(" {upper}\n")));
        assert!(verify_stream(Cursor::new(b"abc"), &upper).unwrap());
    }

    #[test]
    fn file_digest_is_cached_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"first").unwrap();

        let hasher = ContentHasher::default();
        let first = hasher.digest_of_file(&path).unwrap();
        assert_eq!(first, digest(b"first"));
        assert_eq!(hasher.cache().len(), 1);

        // Same path, new content: stale until cleared.
        std::fs::write(&path, b"second").unwrap();
        assert_eq!(hasher.digest_of_file(&path).unwrap(), first);

        hasher.clear_cache();
        assert!(hasher.cache().is_empty());
        assert_eq!(hasher.digest_of_file(&path).unwrap(), digest(b"second"));
    }

    #[test]
    fn uncached_hasher_sees_new_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"first").unwrap();

        let hasher = ContentHasher::uncached();
        hasher.digest_of_file(&path).unwrap();
        std::fs::write(&path, b"second").unwrap();
        assert_eq!(hasher.digest_of_file(&path).unwrap(), digest(b"second"));
        assert_eq!(hasher.cache().len(), 0);
    }

    #[test]
    fn missing_file_error_names_path() {
        let hasher = ContentHasher::uncached();
        let err = hasher
            .digest_of_file(Path::new("/definitely/not/here.bin"))
            .unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.bin"));
    }
}
