//! Session-scoped cache handles.
//!
//! Each trade session starts from a clean slate so stale market data
//! can never leak across attempts. The cache is an explicit collaborator
//! handed to the session, not ambient global state.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

/// Abstraction over session-local storage that must be wiped between
/// decision attempts.
pub trait SessionCache: Send + Sync {
    /// Remove all cached state. Resetting an already-empty cache is a no-op.
    fn reset(&self) -> Result<()>;
}

/// Directory-backed cache: reset deletes the configured directories.
pub struct DirCache {
    roots: Vec<PathBuf>,
}

impl DirCache {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

impl SessionCache for DirCache {
    fn reset(&self) -> Result<()> {
        for root in &self.roots {
            match std::fs::remove_dir_all(root) {
                Ok(()) => {
                    info!(path = %root.display(), "Cleared cache directory");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %root.display(), "Cache directory already absent");
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to clear cache at {}", root.display()));
                }
            }
        }
        Ok(())
    }
}

/// Cache handle that does nothing. Useful when no local state exists.
pub struct NoopCache;

impl SessionCache for NoopCache {
    fn reset(&self) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_cache_removes_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("events");
        let b = tmp.path().join("markets");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        std::fs::write(a.join("x.json"), "{}").unwrap();

        let cache = DirCache::new(vec![a.clone(), b.clone()]);
        cache.reset().unwrap();

        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn test_dir_cache_missing_dir_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = DirCache::new(vec![tmp.path().join("never_created")]);
        cache.reset().unwrap();
        // Second reset still fine.
        cache.reset().unwrap();
    }

    #[test]
    fn test_noop_cache() {
        NoopCache.reset().unwrap();
    }
}
