use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::Cache;
use crate::error::AppError;

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }
}

/// Every this many writes the whole map is swept for expired entries.
const SWEEP_EVERY: usize = 64;

/// Process-local cache. Expired entries are dropped when they are next read,
/// and periodically on write for keys that are never read again.
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    writes: AtomicUsize,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(value: Vec<u8>, ttl: Option<Duration>, now: Instant) -> Entry {
        Entry {
            value,
            expires_at: ttl.map(|ttl| now + ttl),
        }
    }

    /// Called with the write lock held.
    fn maybe_sweep(&self, entries: &mut HashMap<String, Entry>, now: Instant) {
        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(now));
            log::debug!("Cache sweep dropped {} expired entries", before - entries.len());
        }
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        let mut entries = self.entries.write().await;
        if entries.get(key).map_or(false, |entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_bytes(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), AppError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        self.maybe_sweep(&mut entries, now);
        entries.insert(key.to_string(), Self::entry(value, ttl, now));
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<bool, AppError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        self.maybe_sweep(&mut entries, now);
        if entries.get(key).map_or(false, |entry| !entry.is_expired(now)) {
            return Ok(false);
        }
        entries.insert(key.to_string(), Self::entry(value, ttl, now));
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn test_set_get_delete() {
        let cache = InMemoryCache::new();
        assert!(cache.get_bytes("key").await.unwrap().is_none());

        cache.set_bytes("key", b"value".to_vec(), None).await.unwrap();
        assert_eq!(cache.get_bytes("key").await.unwrap(), Some(b"value".to_vec()));

        cache.delete("key").await.unwrap();
        assert!(cache.get_bytes("key").await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_entries_expire() {
        let cache = InMemoryCache::new();
        cache
            .set_bytes("short", b"v".to_vec(), Some(Duration::from_millis(20)))
            .await
            .unwrap();
        cache
            .set_bytes("long", b"v".to_vec(), Some(Duration::from_secs(60)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(cache.get_bytes("short").await.unwrap().is_none());
        assert!(cache.get_bytes("long").await.unwrap().is_some());
    }

    #[actix_rt::test]
    async fn test_set_if_absent() {
        let cache = InMemoryCache::new();
        let ttl = Some(Duration::from_millis(20));

        assert!(cache.set_if_absent("lock", b"1".to_vec(), ttl).await.unwrap());
        assert!(!cache.set_if_absent("lock", b"2".to_vec(), ttl).await.unwrap());
        assert_eq!(cache.get_bytes("lock").await.unwrap(), Some(b"1".to_vec()));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.set_if_absent("lock", b"3".to_vec(), ttl).await.unwrap());
    }

    #[actix_rt::test]
    async fn test_set_if_absent_admits_one_of_concurrent_writers() {
        let cache = InMemoryCache::new();
        let (first, second) = tokio::join!(
            cache.set_if_absent("lock", b"a".to_vec(), None),
            cache.set_if_absent("lock", b"b".to_vec(), None),
        );
        assert_ne!(first.unwrap(), second.unwrap());
    }

    #[actix_rt::test]
    async fn test_writes_sweep_expired_keys() {
        let cache = InMemoryCache::new();
        cache
            .set_bytes("forgotten", b"v".to_vec(), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        for _ in 0..SWEEP_EVERY {
            cache.set_bytes("busy", b"v".to_vec(), None).await.unwrap();
        }

        let entries = cache.entries.read().await;
        assert!(!entries.contains_key("forgotten"));
        assert!(entries.contains_key("busy"));
    }
}
