//! Product image storage on the local filesystem.
//!
//! Uploads are written to `{MEDIA_DIR}/{product_id}/{uuid}.{ext}` and served
//! back by the admin server under `/media/`. Only the content type decides
//! whether a file is accepted; the client's file name is never used on disk.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use tidewear_core::ProductId;

use crate::config::MediaConfig;

/// Accepted image types and the extension they are stored under.
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

/// Errors from storing or removing media files.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("unsupported media type: {0}")]
    UnsupportedType(String),

    #[error("file exceeds the {max} byte limit")]
    TooLarge { max: usize },

    #[error("file is empty")]
    Empty,

    #[error("media path is outside the media directory")]
    InvalidPath,

    #[error("media storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file written by [`MediaStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    /// Public URL of the file.
    pub url: String,
    /// Path relative to the media directory, e.g. `12/3f2c….png`.
    pub file_name: String,
    pub content_type: String,
}

/// Filesystem-backed media storage.
#[derive(Debug, Clone)]
pub struct MediaStore {
    config: MediaConfig,
}

impl MediaStore {
    #[must_use]
    pub const fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// The directory served under `/media`.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.config.dir
    }

    #[must_use]
    pub const fn max_bytes(&self) -> usize {
        self.config.max_bytes
    }

    /// Check an upload before anything touches the disk.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::UnsupportedType`, `MediaError::Empty` or
    /// `MediaError::TooLarge`.
    pub fn validate(&self, content_type: &str, len: usize) -> Result<&'static str, MediaError> {
        let extension = extension_for(content_type)
            .ok_or_else(|| MediaError::UnsupportedType(content_type.to_owned()))?;
        if len == 0 {
            return Err(MediaError::Empty);
        }
        if len > self.config.max_bytes {
            return Err(MediaError::TooLarge {
                max: self.config.max_bytes,
            });
        }
        Ok(extension)
    }

    /// Write an upload for `product_id` under a fresh random name.
    ///
    /// # Errors
    ///
    /// Returns a validation error from [`Self::validate`] or
    /// `MediaError::Io` if the file cannot be written.
    pub async fn save(
        &self,
        product_id: ProductId,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredMedia, MediaError> {
        let extension = self.validate(content_type, bytes.len())?;

        let dir = self.config.dir.join(product_id.to_string());
        fs::create_dir_all(&dir).await?;

        let name = format!("{}.{extension}", Uuid::new_v4());
        fs::write(dir.join(&name), bytes).await?;

        let file_name = format!("{product_id}/{name}");
        tracing::info!(%product_id, file = %file_name, bytes = bytes.len(), "Stored media file");

        Ok(StoredMedia {
            url: format!("{}{file_name}", self.config.base_url),
            file_name,
            content_type: extension_content_type(extension).to_owned(),
        })
    }

    /// Remove a stored file. A file that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidPath` for names that escape the media
    /// directory, `MediaError::Io` for other filesystem failures.
    pub async fn delete(&self, file_name: &str) -> Result<(), MediaError> {
        let path = self.resolve(file_name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(file = %file_name, "Media file already missing");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(&self, file_name: &str) -> Result<PathBuf, MediaError> {
        let relative = Path::new(file_name);
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if file_name.is_empty() || !plain {
            return Err(MediaError::InvalidPath);
        }
        Ok(self.config.dir.join(relative))
    }
}

/// Stored extension for an accepted content type (parameters ignored).
#[must_use]
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_TYPES
        .iter()
        .find_map(|(mime, ext)| (*mime == essence).then_some(*ext))
}

fn extension_content_type(extension: &str) -> &'static str {
    ALLOWED_TYPES
        .iter()
        .find_map(|(mime, ext)| (*ext == extension).then_some(*mime))
        .unwrap_or("application/octet-stream")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store(dir: PathBuf, max_bytes: usize) -> MediaStore {
        MediaStore::new(MediaConfig {
            dir,
            base_url: "http://localhost:3001/media/".to_owned(),
            max_bytes,
        })
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("tidewear-media-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("IMAGE/PNG; charset=binary"), Some("png"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("image/svg+xml"), None);
        assert_eq!(extension_for("application/pdf"), None);
        assert_eq!(extension_for(""), None);
    }

    #[test]
    fn test_validate() {
        let store = store(temp_dir(), 4);
        assert_eq!(store.validate("image/gif", 4).unwrap(), "gif");
        assert!(matches!(store.validate("image/gif", 0), Err(MediaError::Empty)));
        assert!(matches!(
            store.validate("image/gif", 5),
            Err(MediaError::TooLarge { max: 4 })
        ));
        assert!(matches!(
            store.validate("text/plain", 1),
            Err(MediaError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let store = store(temp_dir(), 10);
        assert!(store.resolve("3/abc.png").is_ok());
        assert!(matches!(store.resolve("../etc/passwd"), Err(MediaError::InvalidPath)));
        assert!(matches!(store.resolve("/etc/passwd"), Err(MediaError::InvalidPath)));
        assert!(matches!(store.resolve(""), Err(MediaError::InvalidPath)));
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let dir = temp_dir();
        let store = store(dir.clone(), 1024);
        let product_id = ProductId::new(12);

        let stored = store.save(product_id, "image/png", b"\x89PNG").await.unwrap();
        assert!(stored.file_name.starts_with("12/"));
        assert!(stored.file_name.ends_with(".png"));
        assert_eq!(
            stored.url,
            format!("http://localhost:3001/media/{}", stored.file_name)
        );
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(fs::read(dir.join(&stored.file_name)).await.unwrap(), b"\x89PNG");

        store.delete(&stored.file_name).await.unwrap();
        assert!(!dir.join(&stored.file_name).exists());
        // Deleting twice is fine.
        store.delete(&stored.file_name).await.unwrap();

        fs::remove_dir_all(&dir).await.unwrap();
    }
}
