//! Sync decisions and cycle orchestration.

mod runner;

use std::fmt;

use serde::Serialize;

use crate::models::Post;
use crate::storage::{SnapshotKey, SnapshotStore};
use crate::{Error, Result};

pub use runner::{FailureStage, ItemFailure, RunReport, SyncRunner};

/// What a cycle should do with one fetched post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// No snapshot stored yet
    Create,
    /// Stored snapshot differs or is unreadable
    Update,
    /// Stored snapshot equals the fetched post
    Skip,
}

impl Decision {
    /// Whether the write for this decision may replace an existing object.
    pub const fn overwrites(self) -> bool {
        matches!(self, Self::Update)
    }

    pub const fn writes(self) -> bool {
        !matches!(self, Self::Skip)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Skip => "skip",
        };
        f.write_str(label)
    }
}

/// Compare a fetched post with its stored snapshot.
///
/// Existence alone never skips: the stored content must equal the fetched
/// post. An unreadable snapshot yields `Update` so the next write repairs it.
/// Store failures propagate and are scoped to this post by the caller.
pub async fn decide<B>(post: &Post, store: &B) -> Result<Decision>
where
    B: SnapshotStore + ?Sized,
{
    let key = SnapshotKey::for_post(post.id);
    if !store.exists(&key).await? {
        return Ok(Decision::Create);
    }

    let bytes = match store.read(&key).await {
        Ok(bytes) => bytes,
        Err(Error::NotFound(_)) => return Ok(Decision::Create),
        Err(error) => return Err(error),
    };

    match Post::from_snapshot(&bytes) {
        Ok(stored) if stored == *post => Ok(Decision::Skip),
        Ok(_) => Ok(Decision::Update),
        Err(error) => {
            tracing::warn!(post_id = %post.id, %error, "Stored snapshot is unreadable; overwriting");
            Ok(Decision::Update)
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::models::{sample_post, PostId};
    use crate::storage::MemoryStore;

    async fn store_with(post: &Post) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_raw(SnapshotKey::for_post(post.id), post.to_snapshot().unwrap())
            .await;
        store
    }

    #[tokio::test]
    async fn missing_snapshot_is_create() {
        let store = MemoryStore::new();
        let decision = decide(&sample_post(1, "A"), &store).await.unwrap();
        assert_eq!(decision, Decision::Create);
    }

    #[tokio::test]
    async fn equal_snapshot_is_skip() {
        let post = sample_post(1, "A");
        let store = store_with(&post).await;
        assert_eq!(decide(&post, &store).await.unwrap(), Decision::Skip);
    }

    #[tokio::test]
    async fn edited_fields_are_update() {
        let post = sample_post(1, "A");
        let store = store_with(&post).await;

        let mut retitled = post.clone();
        retitled.title = "A2".to_string();
        assert_eq!(decide(&retitled, &store).await.unwrap(), Decision::Update);

        let mut new_body = post.clone();
        new_body.content.rendered = "<p>rewritten</p>".to_string();
        assert_eq!(decide(&new_body, &store).await.unwrap(), Decision::Update);

        let mut new_excerpt = post;
        new_excerpt.excerpt = "changed".to_string();
        assert_eq!(decide(&new_excerpt, &store).await.unwrap(), Decision::Update);
    }

    #[tokio::test]
    async fn unreadable_snapshot_is_update() {
        let store = MemoryStore::new();
        store
            .insert_raw(SnapshotKey::for_post(PostId::new(1)), "{not json")
            .await;

        let decision = decide(&sample_post(1, "A"), &store).await.unwrap();
        assert_eq!(decision, Decision::Update);
    }

    /// Reports every key as present but has nothing to read.
    struct VanishingStore;

    #[async_trait]
    impl SnapshotStore for VanishingStore {
        async fn exists(&self, _key: &SnapshotKey) -> Result<bool> {
            Ok(true)
        }

        async fn read(&self, key: &SnapshotKey) -> Result<Vec<u8>> {
            Err(Error::NotFound(key.to_string()))
        }

        async fn write(&self, _key: &SnapshotKey, _bytes: &[u8], _overwrite: bool) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn snapshot_removed_after_exists_is_create() {
        let decision = decide(&sample_post(1, "A"), &VanishingStore).await.unwrap();
        assert_eq!(decision, Decision::Create);
    }

    /// Backend that cannot be reached.
    struct OfflineStore;

    #[async_trait]
    impl SnapshotStore for OfflineStore {
        async fn exists(&self, _key: &SnapshotKey) -> Result<bool> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }

        async fn read(&self, _key: &SnapshotKey) -> Result<Vec<u8>> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }

        async fn write(&self, _key: &SnapshotKey, _bytes: &[u8], _overwrite: bool) -> Result<()> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        assert!(matches!(
            decide(&sample_post(1, "A"), &OfflineStore).await,
            Err(Error::StoreUnavailable(_))
        ));
    }

    #[test]
    fn only_update_overwrites() {
        assert!(Decision::Update.overwrites());
        assert!(!Decision::Create.overwrites());
        assert!(!Decision::Skip.overwrites());
        assert!(Decision::Create.writes());
        assert!(!Decision::Skip.writes());
    }
}
