//! Session-lifetime cache of per-file analyses.
//!
//! Entries are keyed by absolute path and never invalidated when the file
//! changes; a hit may be stale for the rest of the session. The cache is
//! bounded and evicts the least recently used entry.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use lru::LruCache;

use super::AnalysisResult;

/// Bounded, thread-safe map from file path to its last successful analysis.
pub struct AnalysisCache {
    entries: Mutex<LruCache<PathBuf, AnalysisResult>>,
}

impl AnalysisCache {
    /// Creates a cache holding at most `capacity` entries (minimum one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self { entries: Mutex::new(LruCache::new(capacity)) }
    }

    /// Returns a copy of the cached analysis for `path`, marking it recently used.
    pub fn get(&self, path: &Path) -> Option<AnalysisResult> {
        self.lock().get(path).cloned()
    }

    /// Stores `result` for `path`, replacing any previous entry.
    pub fn put(&self, path: &Path, result: AnalysisResult) {
        if let Some((evicted, _)) = self.lock().push(path.to_path_buf(), result) {
            if evicted != path {
                tracing::debug!(path = %evicted.display(), "evicted cached analysis");
            }
        }
    }

    /// Number of cached analyses.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<PathBuf, AnalysisResult>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(1024)
    }
}
