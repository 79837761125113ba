//! Lazily opened LMDB backend.
//!
//! Nothing is opened at construction. The first `backend()` call opens the
//! environment and caches it; a failed open is reported as
//! [`StoreError::Unavailable`] and retried on the next call. `invalidate()`
//! drops the cached handle so the next request reopens it.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use microcred_store::{Backend, StoreError, StoreProvider};

use crate::environment::LmdbEnvironment;

pub struct LazyLmdbProvider {
    path: PathBuf,
    map_size: usize,
    cached: Mutex<Option<Arc<LmdbEnvironment>>>,
}

impl LazyLmdbProvider {
    pub fn new(path: impl Into<PathBuf>, map_size: usize) -> Self {
        Self {
            path: path.into(),
            map_size,
            cached: Mutex::new(None),
        }
    }

    /// Whether a handle is currently cached.
    pub fn is_open(&self) -> bool {
        self.cached.lock().map(|c| c.is_some()).unwrap_or(false)
    }
}

impl StoreProvider for LazyLmdbProvider {
    fn backend(&self) -> Result<Arc<dyn Backend>, StoreError> {
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| StoreError::Unavailable("provider lock poisoned".into()))?;
        if let Some(env) = cached.as_ref() {
            return Ok(Arc::clone(env) as Arc<dyn Backend>);
        }
        match LmdbEnvironment::open(&self.path, self.map_size) {
            Ok(env) => {
                let env = Arc::new(env);
                *cached = Some(Arc::clone(&env));
                Ok(env as Arc<dyn Backend>)
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to open database");
                Err(StoreError::Unavailable(e.to_string()))
            }
        }
    }

    fn invalidate(&self) {
        if let Ok(mut cached) = self.cached.lock() {
            if cached.take().is_some() {
                tracing::info!(path = %self.path.display(), "database handle invalidated");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use microcred_store::UserStore;

    const MAP_SIZE: usize = 16 * 1024 * 1024;

    #[test]
    fn opens_on_first_use() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LazyLmdbProvider::new(dir.path().join("db"), MAP_SIZE);
        assert!(!provider.is_open());
        let backend = provider.backend().unwrap();
        assert_eq!(backend.user_count().unwrap(), 0);
        assert!(provider.is_open());
    }

    #[test]
    fn same_handle_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LazyLmdbProvider::new(dir.path(), MAP_SIZE);
        let a = provider.backend().unwrap();
        let b = provider.backend().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        provider.invalidate();
        assert!(!provider.is_open());
    }

    #[test]
    fn open_failure_is_unavailable_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let provider = LazyLmdbProvider::new(blocker.join("db"), MAP_SIZE);
        assert!(matches!(provider.backend(), Err(StoreError::Unavailable(_))));
        assert!(!provider.is_open());
    }
}
