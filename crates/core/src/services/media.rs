//! Media service for uploaded images.

use std::sync::Arc;

use borohub_common::{AppError, AppResult, StorageBackend, UploadedFile, generate_storage_key};
use serde::{Deserialize, Serialize};

/// Maximum number of images attached to a single post.
pub const MAX_POST_MEDIA: usize = 10;

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl ImageFormat {
    /// Get MIME type for this format.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Get file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }
}

/// A file received from a multipart form, before it is stored.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// Client-side file name.
    pub file_name: String,
    /// Declared content type.
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Stores uploaded images through a storage backend.
#[derive(Clone)]
pub struct MediaService {
    storage: Arc<dyn StorageBackend>,
    max_file_size: usize,
}

impl MediaService {
    /// Create a new media service.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, max_file_size: usize) -> Self {
        Self {
            storage,
            max_file_size,
        }
    }

    /// Check an upload without storing it.
    pub fn check(&self, upload: &MediaUpload) -> AppResult<ImageFormat> {
        let format = ImageFormat::from_mime_type(&upload.content_type).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Unsupported file type '{}'. Only jpeg, png, gif and webp images are allowed",
                upload.content_type
            ))
        })?;

        if upload.data.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }
        if upload.data.len() > self.max_file_size {
            return Err(AppError::BadRequest(format!(
                "File too large. Maximum size is {} bytes",
                self.max_file_size
            )));
        }

        Ok(format)
    }

    /// Store one image under `folder/owner_id/`.
    pub async fn store_image(
        &self,
        folder: &str,
        owner_id: &str,
        upload: &MediaUpload,
    ) -> AppResult<UploadedFile> {
        let format = self.check(upload)?;
        self.write(folder, owner_id, upload, format).await
    }

    async fn write(
        &self,
        folder: &str,
        owner_id: &str,
        upload: &MediaUpload,
        format: ImageFormat,
    ) -> AppResult<UploadedFile> {
        // The stored extension follows the accepted type, not the client's name.
        let key = generate_storage_key(folder, owner_id, format.extension());
        let stored = self
            .storage
            .upload(&key, &upload.data, format.mime_type())
            .await?;

        tracing::info!(
            key = %stored.key,
            file_name = %upload.file_name,
            size = stored.size,
            md5 = %stored.md5,
            "Stored uploaded image"
        );
        Ok(stored)
    }

    /// Store the images of a post, in order. Every file is checked before
    /// anything is written, and a failed write removes the files already stored.
    pub async fn store_post_images(
        &self,
        owner_id: &str,
        uploads: &[MediaUpload],
    ) -> AppResult<Vec<UploadedFile>> {
        if uploads.len() > MAX_POST_MEDIA {
            return Err(AppError::BadRequest(format!(
                "A post can carry at most {MAX_POST_MEDIA} images"
            )));
        }
        let formats = uploads
            .iter()
            .map(|upload| self.check(upload))
            .collect::<AppResult<Vec<_>>>()?;

        let mut stored: Vec<UploadedFile> = Vec::with_capacity(uploads.len());
        for (upload, format) in uploads.iter().zip(formats) {
            match self.write("posts", owner_id, upload, format).await {
                Ok(file) => stored.push(file),
                Err(e) => {
                    self.discard(&stored).await;
                    return Err(e);
                }
            }
        }
        Ok(stored)
    }

    /// Remove stored files that ended up unused. Failures are logged only.
    pub async fn discard(&self, files: &[UploadedFile]) {
        for file in files {
            if let Err(e) = self.storage.delete(&file.key).await {
                tracing::warn!(key = %file.key, error = %e, "Failed to remove orphaned image");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use borohub_common::LocalStorage;

    fn upload(content_type: &str, len: usize) -> MediaUpload {
        MediaUpload {
            file_name: "photo.png".to_string(),
            content_type: content_type.to_string(),
            data: vec![7; len],
        }
    }

    fn service(max: usize) -> (MediaService, std::path::PathBuf) {
        let id = borohub_common::IdGenerator::new().generate();
        let dir = std::env::temp_dir().join(format!("borohub-media-{id}"));
        let storage = LocalStorage::new(dir.clone(), "/files".to_string());
        (MediaService::new(Arc::new(storage), max), dir)
    }

    #[test]
    fn test_image_format_from_mime() {
        assert_eq!(ImageFormat::from_mime_type("image/png"), Some(ImageFormat::Png));
        assert_eq!(
            ImageFormat::from_mime_type("IMAGE/JPEG; charset=binary"),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_mime_type("application/pdf"), None);
        assert_eq!(ImageFormat::WebP.extension(), "webp");
    }

    #[test]
    fn test_check_rejects_unsupported_and_oversized() {
        let (svc, _) = service(16);
        assert!(matches!(
            svc.check(&upload("text/plain", 4)),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            svc.check(&upload("image/png", 17)),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            svc.check(&upload("image/png", 0)),
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(svc.check(&upload("image/gif", 16)).unwrap(), ImageFormat::Gif);
    }

    #[tokio::test]
    async fn test_store_post_images_limit() {
        let (svc, _) = service(1024);
        let uploads = vec![upload("image/png", 4); MAX_POST_MEDIA + 1];
        assert!(matches!(
            svc.store_post_images("m1", &uploads).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_store_post_images_writes_files() {
        let (svc, dir) = service(1024);
        let files = svc
            .store_post_images("m1", &[upload("image/png", 4), upload("image/webp", 8)])
            .await
            .unwrap();

        assert_eq!(files.len(), 2);
        assert!(files[0].url.starts_with("/files/posts/m1/"));
        assert!(files[0].url.ends_with(".png"));
        assert!(files[1].url.ends_with(".webp"));
        assert!(dir.join(&files[1].key).exists());

        svc.discard(&files).await;
        assert!(!dir.join(&files[0].key).exists());
        assert!(!dir.join(&files[1].key).exists());

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    /// Accepts one write, fails the next, and records deletions.
    #[derive(Default)]
    struct FlakyStorage {
        writes: std::sync::Mutex<Vec<String>>,
        deleted: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl StorageBackend for FlakyStorage {
        async fn upload(
            &self,
            key: &str,
            data: &[u8],
            content_type: &str,
        ) -> AppResult<UploadedFile> {
            let mut writes = self.writes.lock().unwrap();
            if !writes.is_empty() {
                return Err(AppError::Storage("disk full".to_string()));
            }
            writes.push(key.to_string());
            Ok(UploadedFile {
                key: key.to_string(),
                url: self.public_url(key),
                size: data.len() as u64,
                content_type: content_type.to_string(),
                md5: String::new(),
            })
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.deleted.lock().unwrap().push(key.to_string());
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("/files/{key}")
        }

        async fn exists(&self, _key: &str) -> AppResult<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_failed_post_upload_removes_stored_images() {
        let storage = Arc::new(FlakyStorage::default());
        let svc = MediaService::new(storage.clone(), 1024);

        let result = svc
            .store_post_images("m1", &[upload("image/png", 4), upload("image/png", 4)])
            .await;

        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(*storage.deleted.lock().unwrap(), *storage.writes.lock().unwrap());
        assert_eq!(storage.deleted.lock().unwrap().len(), 1);
    }
}
