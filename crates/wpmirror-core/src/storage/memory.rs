//! In-process snapshot store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{SnapshotKey, SnapshotStore};
use crate::{Error, Result};

/// Snapshot store backed by an ordered in-memory map.
///
/// Used for dry runs and tests; counts successful writes so callers can
/// assert how many objects a cycle touched.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<SnapshotKey, Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed raw bytes without counting a write.
    pub async fn insert_raw(&self, key: SnapshotKey, bytes: impl Into<Vec<u8>>) {
        self.objects.lock().await.insert(key, bytes.into());
    }

    pub async fn get(&self, key: &SnapshotKey) -> Option<Vec<u8>> {
        self.objects.lock().await.get(key).cloned()
    }

    /// Stored keys in ascending order.
    pub async fn keys(&self) -> Vec<SnapshotKey> {
        self.objects.lock().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }

    /// Successful writes since construction.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn exists(&self, key: &SnapshotKey) -> Result<bool> {
        Ok(self.objects.lock().await.contains_key(key))
    }

    async fn read(&self, key: &SnapshotKey) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    async fn write(&self, key: &SnapshotKey, bytes: &[u8], overwrite: bool) -> Result<()> {
        let mut objects = self.objects.lock().await;
        if !overwrite && objects.contains_key(key) {
            return Err(Error::Conflict(key.to_string()));
        }
        objects.insert(key.clone(), bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostId;

    fn key(id: i64) -> SnapshotKey {
        SnapshotKey::for_post(PostId::new(id))
    }

    #[tokio::test]
    async fn read_missing_key_is_not_found() {
        let store = MemoryStore::new();
        assert!(!store.exists(&key(1)).await.unwrap());
        assert!(matches!(store.read(&key(1)).await, Err(Error::NotFound(k)) if k == "1"));
    }

    #[tokio::test]
    async fn write_then_read_returns_bytes() {
        let store = MemoryStore::new();
        store.write(&key(1), b"{}", false).await.unwrap();

        assert!(store.exists(&key(1)).await.unwrap());
        assert_eq!(store.read(&key(1)).await.unwrap(), b"{}".to_vec());
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn create_only_write_conflicts_with_existing_key() {
        let store = MemoryStore::new();
        store.insert_raw(key(1), "old").await;

        assert!(matches!(
            store.write(&key(1), b"new", false).await,
            Err(Error::Conflict(_))
        ));
        assert_eq!(store.get(&key(1)).await.unwrap(), b"old".to_vec());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn overwrite_is_idempotent() {
        let store = MemoryStore::new();
        store.write(&key(2), b"same", true).await.unwrap();
        store.write(&key(2), b"same", true).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&key(2)).await.unwrap(), b"same".to_vec());
    }

    #[tokio::test]
    async fn keys_are_sorted() {
        let store = MemoryStore::new();
        store.insert_raw(key(3), "c").await;
        store.insert_raw(key(1), "a").await;

        let keys: Vec<String> = store.keys().await.iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["1", "3"]);
    }
}
