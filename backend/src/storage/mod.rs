//! Local file storage for document attachments

use crate::config::UploadConfig;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FileStorageError {
    #[error("File size exceeds maximum allowed size of {max_mb}MB")]
    TooLarge { max_mb: u64 },

    #[error("File type {extension} is not allowed. Allowed types: {allowed}")]
    ExtensionNotAllowed { extension: String, allowed: String },

    #[error("Failed to upload file")]
    Io(#[from] std::io::Error),
}

/// A file received from a multipart request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Where and how a file was stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_path: String,
    pub file_name: String,
    pub original_name: String,
    pub size: u64,
}

#[derive(Clone)]
pub struct FileStorage {
    config: Arc<UploadConfig>,
}

/// Lower-cased extension including the dot, or `""` when there is none
fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

impl FileStorage {
    pub fn new(config: UploadConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        Path::new(&self.config.dir)
    }

    /// Size and extension checks, without touching the disk
    pub fn validate(&self, file: &UploadedFile) -> Result<(), FileStorageError> {
        if file.bytes.len() as u64 > self.config.max_file_size_bytes {
            return Err(FileStorageError::TooLarge {
                max_mb: self.config.max_file_size_bytes / 1024 / 1024,
            });
        }

        let extension = extension_of(&file.file_name);
        if !self.config.allowed_extensions.iter().any(|allowed| *allowed == extension) {
            return Err(FileStorageError::ExtensionNotAllowed {
                extension,
                allowed: self.config.allowed_extensions.join(", "),
            });
        }

        Ok(())
    }

    /// Validate and write `file` under the upload directory as
    /// `doc-<unix-millis>-<uuid><ext>`
    pub async fn save(&self, file: &UploadedFile) -> Result<StoredFile, FileStorageError> {
        self.validate(file)?;

        tokio::fs::create_dir_all(self.upload_dir()).await?;

        let file_name = format!(
            "doc-{}-{}{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4(),
            extension_of(&file.file_name)
        );
        let path: PathBuf = self.upload_dir().join(&file_name);
        tokio::fs::write(&path, &file.bytes).await?;

        debug!(path = %path.display(), size = file.bytes.len(), "Stored upload");

        Ok(StoredFile {
            file_path: path.to_string_lossy().into_owned(),
            file_name,
            original_name: file.file_name.clone(),
            size: file.bytes.len() as u64,
        })
    }

    /// Remove a stored file. Returns whether a file was deleted; failures
    /// are logged and reported as `false`. Paths that do not resolve to
    /// somewhere under the upload directory are left alone.
    pub async fn delete(&self, file_path: &str) -> bool {
        let resolved = match tokio::fs::canonicalize(file_path).await {
            Ok(path) => path,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return false,
            Err(e) => {
                error!(error = %e, path = file_path, "File deletion error");
                return false;
            }
        };
        let Ok(root) = tokio::fs::canonicalize(self.upload_dir()).await else {
            warn!(path = file_path, "Refusing to delete file outside the upload directory");
            return false;
        };
        if !resolved.starts_with(&root) {
            warn!(path = file_path, "Refusing to delete file outside the upload directory");
            return false;
        }

        match tokio::fs::remove_file(&resolved).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                error!(error = %e, path = file_path, "File deletion error");
                false
            }
        }
    }
}
