//! Process-scoped asset byte cache
//!
//! Keeps every fetched blob for the lifetime of the process so repeated
//! composites and mesh lookups never refetch. Entries are never evicted;
//! the working set (a few hundred small masks and meshes) is bounded by the
//! asset ID space, not by traffic.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::debug;

use super::AssetId;

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Bytes,
    access_count: u64,
}

/// Cache performance statistics.
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    pub total_bytes_cached: u64,
    pub cache_entries: usize,
}

impl CacheStats {
    /// Cache hit ratio as a percentage.
    pub fn hit_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            (self.hits as f64 / self.total_requests as f64) * 100.0
        }
    }
}

/// Shared byte cache keyed by asset ID.
#[derive(Debug, Default)]
pub struct AssetCache {
    entries: Arc<RwLock<HashMap<AssetId, CacheEntry>>>,
    stats: Arc<RwLock<CacheStats>>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a blob from the cache if present.
    pub async fn get(&self, id: &AssetId) -> Option<Bytes> {
        let mut stats = self.stats.write().await;
        stats.total_requests += 1;

        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(id) {
            entry.access_count += 1;
            stats.hits += 1;
            debug!("cache hit for asset {}", id);
            Some(entry.data.clone())
        } else {
            stats.misses += 1;
            debug!("cache miss for asset {}", id);
            None
        }
    }

    /// Store a blob. A blob already present for the same ID is kept.
    pub async fn put(&self, id: AssetId, data: Bytes) {
        let size = data.len();
        let mut entries = self.entries.write().await;
        if entries.contains_key(&id) {
            return;
        }

        entries.insert(id, CacheEntry { data, access_count: 1 });

        let mut stats = self.stats.write().await;
        stats.total_bytes_cached += size as u64;
        stats.cache_entries = entries.len();
        debug!("cached asset {} ({} bytes)", id, size);
    }

    pub async fn contains(&self, id: &AssetId) -> bool {
        self.entries.read().await.contains_key(id)
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        self.stats.write().await.cache_entries = 0;
        debug!("cleared {} assets from cache", count);
    }

    pub async fn stats(&self) -> CacheStats {
        let mut stats = self.stats.read().await.clone();
        stats.cache_entries = self.entries.read().await.len();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_miss_then_hit() {
        let cache = AssetCache::new();
        let id = AssetId(42);
        assert!(cache.get(&id).await.is_none());

        cache.put(id, Bytes::from_static(b"pixels")).await;
        assert_eq!(cache.get(&id).await.unwrap(), Bytes::from_static(b"pixels"));

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.cache_entries, 1);
    }

    #[tokio::test]
    async fn test_put_keeps_first_blob() {
        let cache = AssetCache::new();
        let id = AssetId(7);
        cache.put(id, Bytes::from_static(b"first")).await;
        cache.put(id, Bytes::from_static(b"second")).await;
        assert_eq!(cache.get(&id).await.unwrap(), Bytes::from_static(b"first"));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = AssetCache::new();
        cache.put(AssetId(1), Bytes::from_static(b"a")).await;
        cache.put(AssetId(2), Bytes::from_static(b"b")).await;
        cache.clear().await;
        assert!(!cache.contains(&AssetId(1)).await);
        assert_eq!(cache.stats().await.cache_entries, 0);
    }

    #[tokio::test]
    async fn test_hit_ratio() {
        let cache = AssetCache::new();
        cache.put(AssetId(1), Bytes::from_static(b"a")).await;
        cache.get(&AssetId(1)).await;
        cache.get(&AssetId(2)).await;
        let stats = cache.stats().await;
        assert!((stats.hit_ratio() - 50.0).abs() < f64::EPSILON);
    }
}
