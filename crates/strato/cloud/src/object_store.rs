//! Object storage boundary.
//!
//! Covers the four operations the orchestrator needs: publish documents
//! and artifacts, presign them for the control plane, list a prefix for
//! artifact retention, and delete expired artifacts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::{CloudError, CloudResult};

/// Key and modification time of a stored object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

/// Object storage operations used by the orchestrator.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> CloudResult<()>;

    /// A URL the control plane can fetch the object through.
    async fn presigned_url(&self, bucket: &str, key: &str) -> CloudResult<String>;

    /// Objects under `prefix`, in no particular order.
    async fn list(&self, bucket: &str, prefix: &str) -> CloudResult<Vec<ObjectMeta>>;

    async fn delete(&self, bucket: &str, key: &str) -> CloudResult<()>;
}

struct StoredObject {
    body: Vec<u8>,
    last_modified: DateTime<Utc>,
}

/// In-memory object store for tests.
///
/// Modification times come from a logical clock so listings order
/// deterministically even when writes land within the same instant.
/// Presigned URLs embed a content digest, which makes them stable for
/// unchanged content and distinct for changed content — the property the
/// simulated control plane uses to detect no-op updates.
pub struct InMemoryObjectStore {
    objects: DashMap<(String, String), StoredObject>,
    clock: AtomicI64,
}

const CLOCK_EPOCH: i64 = 1_700_000_000;

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            clock: AtomicI64::new(0),
        }
    }

    fn tick(&self) -> DateTime<Utc> {
        let n = self.clock.fetch_add(1, Ordering::SeqCst);
        DateTime::from_timestamp(CLOCK_EPOCH + n, 0).unwrap_or_else(Utc::now)
    }

    /// Insert an object with an explicit modification time.
    pub fn put_with_last_modified(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        last_modified: DateTime<Utc>,
    ) {
        self.objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                last_modified,
            },
        );
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    pub fn body(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.body.clone())
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> CloudResult<()> {
        let last_modified = self.tick();
        self.objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                last_modified,
            },
        );
        Ok(())
    }

    async fn presigned_url(&self, bucket: &str, key: &str) -> CloudResult<String> {
        let entry = self
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .ok_or_else(|| CloudError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;
        let digest = Sha256::digest(&entry.body);
        Ok(format!("mem://{bucket}/{key}?etag={:x}", digest))
    }

    async fn list(&self, bucket: &str, prefix: &str) -> CloudResult<Vec<ObjectMeta>> {
        Ok(self
            .objects
            .iter()
            .filter(|entry| entry.key().0 == bucket && entry.key().1.starts_with(prefix))
            .map(|entry| ObjectMeta {
                key: entry.key().1.clone(),
                last_modified: entry.value().last_modified,
            })
            .collect())
    }

    async fn delete(&self, bucket: &str, key: &str) -> CloudResult<()> {
        self.objects.remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}
