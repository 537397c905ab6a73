//! Where uploaded media lives.
//!
//! Services only see [`StorageBackend`]. The server wires in
//! [`LocalStorage`], which writes under a directory and hands out URLs below
//! a public prefix that the server also serves.

use std::path::{Component, Path, PathBuf};

use ulid::Ulid;

use crate::{AppError, AppResult};

/// A file that has been written to storage.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Key relative to the storage root, e.g. `avatars/{member}/{ulid}.png`.
    pub key: String,
    /// Public URL of the file.
    pub url: String,
    pub size: u64,
    pub content_type: String,
    /// Hex MD5 of the stored bytes.
    pub md5: String,
}

/// Storage backend for uploaded media.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write `data` under `key`, replacing anything already there.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str)
    -> AppResult<UploadedFile>;

    /// Remove the file under `key`. Missing files are not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    fn public_url(&self, key: &str) -> String;

    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Filesystem storage rooted at `base_path`, published under `base_url`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }

    /// Resolve a key to a path under the root. Keys that would climb out of
    /// the root, or are absolute, are rejected.
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if key.is_empty() || !plain {
            return Err(AppError::Storage(format!("Invalid storage key: {key}")));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile> {
        let path = self.resolve(key)?;

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create {}: {e}", dir.display())))?;
        }
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {key}: {e}")))?;

        tracing::debug!(key = %key, size = data.len(), "Wrote media file");

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5: format!("{:x}", md5::compute(data)),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete {key}: {e}"))),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url.trim_end_matches('/'))
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.resolve(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to stat {key}: {e}")))
    }
}

/// A fresh key of the form `{folder}/{owner_id}/{ulid}.{extension}`.
#[must_use]
pub fn generate_storage_key(folder: &str, owner_id: &str, extension: &str) -> String {
    let id = Ulid::new().to_string().to_lowercase();
    format!("{folder}/{owner_id}/{id}.{}", extension.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> (LocalStorage, PathBuf) {
        let dir = std::env::temp_dir().join(format!("borohub-storage-{}", Ulid::new()));
        (LocalStorage::new(dir.clone(), "/files/".to_string()), dir)
    }

    #[test]
    fn test_generate_storage_key() {
        let key = generate_storage_key("posts", "member123", "PNG");
        assert!(key.starts_with("posts/member123/"));
        assert!(key.ends_with(".png"));
        assert_eq!(key.len(), "posts/member123/".len() + 26 + ".png".len());
    }

    #[test]
    fn test_resolve_rejects_escaping_keys() {
        let (storage, _) = temp_storage();
        assert!(storage.resolve("avatars/m1/a.png").is_ok());
        assert!(matches!(
            storage.resolve("../etc/passwd"),
            Err(AppError::Storage(_))
        ));
        assert!(matches!(storage.resolve("/abs"), Err(AppError::Storage(_))));
        assert!(matches!(storage.resolve(""), Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn test_local_storage_write_and_remove() {
        let (storage, dir) = temp_storage();

        let uploaded = storage
            .upload("posts/m1/a.png", b"png-bytes", "image/png")
            .await
            .unwrap_or_else(|e| panic!("upload failed: {e}"));
        assert_eq!(uploaded.url, "/files/posts/m1/a.png");
        assert_eq!(uploaded.size, 9);
        assert_eq!(uploaded.md5.len(), 32);
        assert!(matches!(storage.exists("posts/m1/a.png").await, Ok(true)));

        assert!(storage.delete("posts/m1/a.png").await.is_ok());
        assert!(matches!(storage.exists("posts/m1/a.png").await, Ok(false)));
        // Deleting again is fine.
        assert!(storage.delete("posts/m1/a.png").await.is_ok());

        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
