//! Per-file locks that keep two invocations from merging into the same
//! target resource at once.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use lazy_static::lazy_static;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

lazy_static! {
    static ref GLOBAL_REGISTRY: Arc<TargetLockRegistry> = Arc::new(TargetLockRegistry::new());
}

/// A registry of async locks keyed by absolute file path.
#[derive(Debug, Default)]
pub struct TargetLockRegistry {
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl TargetLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Arc<TargetLockRegistry> {
        GLOBAL_REGISTRY.clone()
    }

    /// Waits until every path in `paths` is free and locks them all.
    ///
    /// Paths are normalized to absolute form, deduplicated and locked in
    /// sorted order, so concurrent callers with overlapping sets cannot
    /// deadlock.
    pub async fn acquire<'a, I>(self: Arc<Self>, paths: I) -> TargetLocks
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut keys: Vec<PathBuf> = paths.into_iter().map(absolute).collect();
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            let mutex = {
                let mut locks = self.table();
                locks.entry(key.clone()).or_default().clone()
            };
            debug!(path = %key.display(), "waiting for target lock");
            guards.push(mutex.lock_owned().await);
        }

        TargetLocks {
            registry: self,
            paths: keys,
            guards,
        }
    }

    /// Number of paths currently tracked.
    pub fn tracked(&self) -> usize {
        self.table().len()
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<AsyncMutex<()>>>> {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Held target locks; released on drop.
#[derive(Debug)]
pub struct TargetLocks {
    registry: Arc<TargetLockRegistry>,
    paths: Vec<PathBuf>,
    guards: Vec<OwnedMutexGuard<()>>,
}

impl TargetLocks {
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Drop for TargetLocks {
    fn drop(&mut self) {
        self.guards.clear();
        let mut locks = self.registry.table();
        for path in &self.paths {
            if locks.get(path).is_some_and(|m| Arc::strong_count(m) == 1) {
                locks.remove(path);
            }
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_acquire_dedups_and_releases() {
        let registry = Arc::new(TargetLockRegistry::new());
        let a = Path::new("/tmp/proptrans-lock/a.properties");
        let locks = Arc::clone(&registry).acquire([a, a]).await;
        assert_eq!(locks.paths().len(), 1);
        assert_eq!(registry.tracked(), 1);
        drop(locks);
        assert_eq!(registry.tracked(), 0);
    }

    #[tokio::test]
    async fn test_second_holder_waits_for_release() {
        let registry = Arc::new(TargetLockRegistry::new());
        let a = Path::new("/tmp/proptrans-lock/b.properties");
        let first = Arc::clone(&registry).acquire([a]).await;

        let contender = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                let _locks = registry
                    .acquire([Path::new("/tmp/proptrans-lock/b.properties")])
                    .await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());
        drop(first);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender should acquire after release")
            .unwrap();
    }

    #[tokio::test]
    async fn test_relative_and_absolute_paths_share_a_lock() {
        let registry = Arc::new(TargetLockRegistry::new());
        let relative = Path::new("messages_es.properties");
        let absolute_path = std::env::current_dir().unwrap().join(relative);
        let locks = registry.acquire([relative, absolute_path.as_path()]).await;
        assert_eq!(locks.paths().len(), 1);
    }
}
