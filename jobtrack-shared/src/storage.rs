/// File storage for resumes and profile pictures
///
/// Files live in per-kind folders under a root directory and are addressed
/// by a public URL (`<public_base_url>/<folder>/<file_name>`). The API
/// serves the root directory statically under that base URL.
///
/// # Upload rules
///
/// | Kind            | Content type      | Max size |
/// |-----------------|-------------------|----------|
/// | Resume          | `application/pdf` | 1 MiB    |
/// | Profile picture | `image/*`         | 500 KiB  |
///
/// # Example
///
/// ```no_run
/// use bytes::Bytes;
/// use jobtrack_shared::storage::{FileStorage, LocalFileStorage, RESUME_FOLDER};
///
/// # async fn example() -> Result<(), jobtrack_shared::storage::StorageError> {
/// let storage = LocalFileStorage::new("./uploads", "/files");
/// let url = storage
///     .put(RESUME_FOLDER, "resume.pdf", Bytes::from_static(b"%PDF-1.7"))
///     .await?;
/// assert_eq!(url, "/files/resumes/resume.pdf");
///
/// storage.delete_by_url(&url).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tracing::{debug, warn};
use uuid::Uuid;

/// Folder holding resumes
pub const RESUME_FOLDER: &str = "resumes";

/// Folder holding profile pictures
pub const PROFILE_PICTURE_FOLDER: &str = "profile-pictures";

/// Maximum resume size in bytes (1 MiB)
pub const MAX_RESUME_BYTES: usize = 1024 * 1024;

/// Maximum profile picture size in bytes (500 KiB)
pub const MAX_IMAGE_BYTES: usize = 500 * 1024;

/// Error type for storage operations and upload validation
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Upload has a disallowed content type
    #[error("{0}")]
    InvalidType(String),

    /// Upload exceeds the size limit
    #[error("{0}")]
    TooLarge(String),

    /// Name or URL does not map to a file under the storage root
    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    /// Filesystem failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Checks a resume upload's content type and size
pub fn validate_resume(content_type: Option<&str>, len: usize) -> Result<(), StorageError> {
    if content_type != Some("application/pdf") {
        return Err(StorageError::InvalidType(
            "File type not allowed. Please upload a PDF file".to_string(),
        ));
    }
    if len > MAX_RESUME_BYTES {
        return Err(StorageError::TooLarge(
            "File size too large. Maximum size allowed is 1MB".to_string(),
        ));
    }
    Ok(())
}

/// Checks a profile picture upload and returns the file extension to use
pub fn validate_image(content_type: Option<&str>, len: usize) -> Result<&'static str, StorageError> {
    let content_type = content_type
        .filter(|ct| ct.starts_with("image/"))
        .ok_or_else(|| {
            StorageError::InvalidType("Not an image! Please upload only images.".to_string())
        })?;

    if len > MAX_IMAGE_BYTES {
        return Err(StorageError::TooLarge(
            "File size too large. Maximum size allowed is 500KB".to_string(),
        ));
    }

    Ok(match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "img",
    })
}

/// Stored resume name: `<user_id>_<uuid>.pdf`
pub fn resume_file_name(user_id: Uuid) -> String {
    format!("{}_{}.pdf", user_id, Uuid::new_v4())
}

/// Stored profile picture name: `<user_id>_<uuid>.<ext>`
pub fn image_file_name(user_id: Uuid, extension: &str) -> String {
    format!("{}_{}.{}", user_id, Uuid::new_v4(), extension)
}

/// Where uploaded files go
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Stores `bytes` as `folder/file_name` and returns its public URL
    async fn put(&self, folder: &str, file_name: &str, bytes: Bytes) -> Result<String, StorageError>;

    /// Removes the file behind a public URL; a missing file is not an error
    async fn delete_by_url(&self, url: &str) -> Result<(), StorageError>;
}

/// Stores files on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Maps a public URL back to a path under the root
    fn path_for_url(&self, url: &str) -> Result<PathBuf, StorageError> {
        let relative = url
            .strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| StorageError::InvalidPath(url.to_string()))?;

        let mut path = self.root.clone();
        for segment in relative.split('/') {
            check_segment(segment)?;
            path.push(segment);
        }
        Ok(path)
    }
}

fn check_segment(segment: &str) -> Result<(), StorageError> {
    let unsafe_segment = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\']);

    if unsafe_segment {
        return Err(StorageError::InvalidPath(segment.to_string()));
    }
    Ok(())
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn put(&self, folder: &str, file_name: &str, bytes: Bytes) -> Result<String, StorageError> {
        check_segment(folder)?;
        check_segment(file_name)?;

        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(file_name), &bytes).await?;

        debug!(folder, file_name, size = bytes.len(), "File stored");
        Ok(format!("{}/{}/{}", self.public_base_url, folder, file_name))
    }

    async fn delete_by_url(&self, url: &str) -> Result<(), StorageError> {
        let path = self.path_for_url(url)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "File removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "File to remove was already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("jobtrack-storage-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_validate_resume() {
        assert!(validate_resume(Some("application/pdf"), 1024).is_ok());
        assert!(validate_resume(Some("application/pdf"), MAX_RESUME_BYTES).is_ok());

        assert!(matches!(
            validate_resume(Some("application/pdf"), MAX_RESUME_BYTES + 1),
            Err(StorageError::TooLarge(_))
        ));
        assert!(matches!(
            validate_resume(Some("image/png"), 10),
            Err(StorageError::InvalidType(_))
        ));
        assert!(matches!(
            validate_resume(None, 10),
            Err(StorageError::InvalidType(_))
        ));
    }

    #[test]
    fn test_validate_image() {
        assert_eq!(validate_image(Some("image/png"), 100).unwrap(), "png");
        assert_eq!(validate_image(Some("image/jpeg"), 100).unwrap(), "jpg");
        assert_eq!(validate_image(Some("image/bmp"), 100).unwrap(), "img");

        assert!(matches!(
            validate_image(Some("image/png"), MAX_IMAGE_BYTES + 1),
            Err(StorageError::TooLarge(_))
        ));
        assert!(matches!(
            validate_image(Some("application/pdf"), 100),
            Err(StorageError::InvalidType(_))
        ));
    }

    #[test]
    fn test_file_names() {
        let user_id = Uuid::new_v4();
        let name = resume_file_name(user_id);
        assert!(name.starts_with(&format!("{}_", user_id)));
        assert!(name.ends_with(".pdf"));
        assert_ne!(name, resume_file_name(user_id));

        assert!(image_file_name(user_id, "png").ends_with(".png"));
    }

    #[tokio::test]
    async fn test_put_and_delete() {
        let root = temp_root();
        let storage = LocalFileStorage::new(&root, "/files/");

        let url = storage
            .put(RESUME_FOLDER, "cv.pdf", Bytes::from_static(b"%PDF-1.7"))
            .await
            .unwrap();
        assert_eq!(url, "/files/resumes/cv.pdf");

        let on_disk = tokio::fs::read(root.join("resumes/cv.pdf")).await.unwrap();
        assert_eq!(on_disk, b"%PDF-1.7");

        storage.delete_by_url(&url).await.unwrap();
        assert!(!root.join("resumes/cv.pdf").exists());

        // Second delete is a no-op
        storage.delete_by_url(&url).await.unwrap();

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_rejects_paths_outside_root() {
        let storage = LocalFileStorage::new(temp_root(), "/files");

        assert!(matches!(
            storage.put("..", "x.pdf", Bytes::new()).await,
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            storage.delete_by_url("/files/../etc/passwd").await,
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            storage.delete_by_url("https://elsewhere.example/a.pdf").await,
            Err(StorageError::InvalidPath(_))
        ));
    }
}
