//! Snapshot storage abstractions for object backends.

mod memory;
mod r2;

use std::fmt;

use async_trait::async_trait;

use crate::models::PostId;
use crate::Result;

pub use memory::MemoryStore;
pub use r2::{R2Config, R2Storage};

/// Domain key of a stored snapshot: the stringified post id.
///
/// Backends may decorate it (prefix, extension) when mapping to object keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotKey(String);

impl SnapshotKey {
    #[must_use]
    pub fn for_post(id: PostId) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key-value persistence for post snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Check whether a snapshot is stored under `key`.
    async fn exists(&self, key: &SnapshotKey) -> Result<bool>;

    /// Read snapshot bytes; fails with `NotFound` when the key is absent.
    async fn read(&self, key: &SnapshotKey) -> Result<Vec<u8>>;

    /// Store snapshot bytes.
    ///
    /// With `overwrite == false` the write fails with `Conflict` when the key
    /// already exists. Writing identical bytes twice leaves the same state.
    async fn write(&self, key: &SnapshotKey, bytes: &[u8], overwrite: bool) -> Result<()>;
}
