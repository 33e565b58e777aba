//! Process-lifetime memo of base-asset identifiers
//!
//! Secondary-source lookups are keyed by the lower-cased base asset. The
//! map hands out one [`OnceCell`] per key, so concurrent first access for
//! the same asset performs a single lookup while different assets resolve
//! in parallel. A lookup that finds nothing leaves its cell empty and is
//! retried on the next request.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// Concurrency-safe identifier cache, never invalidated
#[derive(Debug, Default)]
pub struct IdentifierCache {
    cells: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
}

impl IdentifierCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, key: &str) -> Arc<OnceCell<String>> {
        // A poisoned map is still structurally sound; keep serving it
        let mut cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
        cells
            .entry(key.to_lowercase())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// Cached identifier for `key`, if one was resolved earlier
    pub fn get(&self, key: &str) -> Option<String> {
        let cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
        cells.get(&key.to_lowercase())?.get().cloned()
    }

    /// Return the cached identifier or run `resolve` once to obtain it
    pub async fn get_or_resolve<F, Fut>(&self, key: &str, resolve: F) -> Option<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<String>>,
    {
        let cell = self.cell(key);
        cell.get_or_try_init(move || async move { resolve().await.ok_or(()) })
            .await
            .ok()
            .cloned()
    }

    /// Number of resolved identifiers
    pub fn len(&self) -> usize {
        let cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
        cells.values().filter(|c| c.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_resolves_once_and_is_case_insensitive() {
        let cache = IdentifierCache::new();
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_resolve("BTC", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Some("bitcoin".to_string())
            })
            .await;
        let second = cache
            .get_or_resolve("btc", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Some("other".to_string())
            })
            .await;

        assert_eq!(first.as_deref(), Some("bitcoin"));
        assert_eq!(second.as_deref(), Some("bitcoin"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("Btc").as_deref(), Some("bitcoin"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_misses_are_not_cached() {
        let cache = IdentifierCache::new();
        assert_eq!(cache.get_or_resolve("XYZ", || async { None }).await, None);
        assert!(cache.is_empty());

        let later = cache
            .get_or_resolve("XYZ", || async { Some("xyz-token".to_string()) })
            .await;
        assert_eq!(later.as_deref(), Some("xyz-token"));
    }

    #[tokio::test]
    async fn test_concurrent_first_access_single_lookup() {
        let cache = Arc::new(IdentifierCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_resolve("ETH", || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Some("ethereum".to_string())
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().as_deref(), Some("ethereum"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
