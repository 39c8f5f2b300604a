//! Filesystem backend: `<root>/<id>.bin` plus `<root>/<id>.json` metadata.
//!
//! Writes go to a temp file first and are renamed into place, so a reader
//! never sees a half-written object.

use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use super::StorageError;
use super::store::{ObjectMeta, ObjectStore, StoredObject, Visibility};

pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{id}.bin"))
    }

    fn meta_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let tmp = path.with_extension(format!("tmp-{}", Uuid::new_v4().simple()));
        fs::write(&tmp, bytes).await?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn read_meta(&self, id: Uuid) -> Result<Option<ObjectMeta>, StorageError> {
        match fs::read(self.meta_path(id)).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_meta(&self, meta: &ObjectMeta) -> Result<(), StorageError> {
        let raw = serde_json::to_vec_pretty(meta)?;
        Self::write_atomic(&self.meta_path(meta.id), &raw).await
    }
}

#[async_trait::async_trait]
impl ObjectStore for FsStore {
    async fn put(&self, meta: ObjectMeta, bytes: Vec<u8>) -> Result<(), StorageError> {
        // Data before metadata: an object is visible only once its metadata exists.
        Self::write_atomic(&self.data_path(meta.id), &bytes).await?;
        self.write_meta(&meta).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredObject>, StorageError> {
        let Some(meta) = self.read_meta(id).await? else {
            return Ok(None);
        };
        match fs::read(self.data_path(id)).await {
            Ok(bytes) => Ok(Some(StoredObject { meta, bytes })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(%id, "object metadata without data file");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn head(&self, id: Uuid) -> Result<Option<ObjectMeta>, StorageError> {
        self.read_meta(id).await
    }

    async fn set_visibility(&self, id: Uuid, visibility: Visibility) -> Result<Option<ObjectMeta>, StorageError> {
        let Some(mut meta) = self.read_meta(id).await? else {
            return Ok(None);
        };
        meta.visibility = visibility;
        self.write_meta(&meta).await?;
        Ok(Some(meta))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StorageError> {
        let existed = self.read_meta(id).await?.is_some();
        for path in [self.meta_path(id), self.data_path(id)] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(existed)
    }
}

#[cfg(test)]
#[path = "fs_test.rs"]
mod tests;
