use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    #[error("photo not found")]
    NotFound,

    #[error("photo storage I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// On-disk photo storage.
///
/// Each photo lives at `{dir}/{owner_id}/{photo_id}.jpg`. Both ids must
/// parse as UUIDs; anything else is `NotFound`.
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    pub async fn new(dir: PathBuf) -> Result<Self, PhotoError> {
        fs::create_dir_all(&dir).await?;
        info!("Photo storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn photo_path(&self, owner_id: &str, photo_id: &str) -> Result<PathBuf, PhotoError> {
        let owner = Uuid::parse_str(owner_id).map_err(|_| PhotoError::NotFound)?;
        let photo = Uuid::parse_str(photo_id).map_err(|_| PhotoError::NotFound)?;
        Ok(self
            .dir
            .join(owner.hyphenated().to_string())
            .join(format!("{}.jpg", photo.hyphenated())))
    }

    /// Store `data` as a new photo for `owner_id` and return its id.
    pub async fn save(&self, owner_id: &str, data: &[u8]) -> Result<String, PhotoError> {
        let photo_id = Uuid::new_v4().to_string();
        let path = self.photo_path(owner_id, &photo_id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;
        info!(
            "Stored photo {} for {} ({} bytes)",
            photo_id,
            owner_id,
            data.len()
        );
        Ok(photo_id)
    }

    pub async fn get(&self, owner_id: &str, photo_id: &str) -> Result<Vec<u8>, PhotoError> {
        let path = self.photo_path(owner_id, photo_id)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PhotoError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, owner_id: &str, photo_id: &str) -> Result<(), PhotoError> {
        let path = self.photo_path(owner_id, photo_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted photo {} for {}", photo_id, owner_id);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PhotoError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, PhotoStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(tmp.path().join("photos")).await.unwrap();
        (tmp, store)
    }

    fn owner() -> String {
        Uuid::new_v4().to_string()
    }

    #[tokio::test]
    async fn new_creates_directory() {
        let (_tmp, store) = store().await;
        assert!(store.dir().is_dir());
    }

    #[tokio::test]
    async fn save_then_get_returns_same_bytes() {
        let (_tmp, store) = store().await;
        let owner = owner();
        let id = store.save(&owner, b"\xff\xd8jpeg").await.unwrap();

        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(store.get(&owner, &id).await.unwrap(), b"\xff\xd8jpeg");
    }

    #[tokio::test]
    async fn photos_are_scoped_to_owner() {
        let (_tmp, store) = store().await;
        let owner = owner();
        let id = store.save(&owner, b"data").await.unwrap();

        assert!(matches!(
            store.get(&self::owner(), &id).await,
            Err(PhotoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_removes_file_once() {
        let (_tmp, store) = store().await;
        let owner = owner();
        let id = store.save(&owner, b"data").await.unwrap();

        store.delete(&owner, &id).await.unwrap();
        assert!(matches!(store.get(&owner, &id).await, Err(PhotoError::NotFound)));
        assert!(matches!(
            store.delete(&owner, &id).await,
            Err(PhotoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn non_uuid_ids_are_not_found() {
        let (_tmp, store) = store().await;
        let owner = owner();

        assert!(matches!(
            store.get(&owner, "../../etc/passwd").await,
            Err(PhotoError::NotFound)
        ));
        assert!(matches!(
            store.save("not-a-user", b"x").await,
            Err(PhotoError::NotFound)
        ));
        assert!(matches!(
            store.delete(&owner, "nope").await,
            Err(PhotoError::NotFound)
        ));
    }
}
