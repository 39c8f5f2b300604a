//! Object store trait and the in-memory backend.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Public,
}

/// Metadata stored beside each object's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub id: Uuid,
    pub content_type: String,
    pub size: u64,
    /// Lowercase hex SHA-256 of the bytes; doubles as the `ETag`.
    pub sha256: String,
    pub visibility: Visibility,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub meta: ObjectMeta,
    pub bytes: Vec<u8>,
}

/// Byte storage keyed by object id.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Insert or replace an object.
    async fn put(&self, meta: ObjectMeta, bytes: Vec<u8>) -> Result<(), StorageError>;

    async fn get(&self, id: Uuid) -> Result<Option<StoredObject>, StorageError>;

    async fn head(&self, id: Uuid) -> Result<Option<ObjectMeta>, StorageError>;

    /// Change visibility, returning the updated metadata or `None` if absent.
    async fn set_visibility(&self, id: Uuid, visibility: Visibility) -> Result<Option<ObjectMeta>, StorageError>;

    /// Returns whether an object was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StorageError>;
}

/// Process-local store. Contents vanish on restart.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<Uuid, StoredObject>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, meta: ObjectMeta, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.objects
            .write()
            .await
            .insert(meta.id, StoredObject { meta, bytes });
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredObject>, StorageError> {
        Ok(self.objects.read().await.get(&id).cloned())
    }

    async fn head(&self, id: Uuid) -> Result<Option<ObjectMeta>, StorageError> {
        Ok(self
            .objects
            .read()
            .await
            .get(&id)
            .map(|o| o.meta.clone()))
    }

    async fn set_visibility(&self, id: Uuid, visibility: Visibility) -> Result<Option<ObjectMeta>, StorageError> {
        let mut objects = self.objects.write().await;
        Ok(objects.get_mut(&id).map(|o| {
            o.meta.visibility = visibility;
            o.meta.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StorageError> {
        Ok(self.objects.write().await.remove(&id).is_some())
    }
}
