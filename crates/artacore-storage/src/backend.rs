//! Storage backend trait

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

use crate::error::StorageError;

/// Where a file ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Final file name, `<millis>-<seq>-<sanitised original name>`
    pub file_name: String,
    /// Folder under the storage root
    pub folder: String,
    /// Public URL, e.g. `/uploads/image/1700000000000-cat.png`
    pub url: String,
    pub size: u64,
}

/// Storage backend trait
///
/// Implementations place uploaded files under a folder and report the
/// public URL they will be served from.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store `data` under `folder` using a unique name derived from `original_name`
    async fn save(
        &self,
        folder: &str,
        original_name: &str,
        data: Bytes,
    ) -> Result<StoredFile, StorageError>;

    /// Delete a stored file
    async fn delete(&self, folder: &str, file_name: &str) -> Result<bool, StorageError>;

    /// Get the filesystem root that files are served from
    fn root(&self) -> &Path;
}

/// Coarse media classification used as the storage folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    File,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::File => "file",
        }
    }

    /// Classify by the file name's guessed MIME type
    pub fn from_file_name(name: &str) -> Self {
        match mime_guess::from_path(name).first() {
            Some(mime) if mime.type_() == mime_guess::mime::IMAGE => MediaKind::Image,
            Some(mime) if mime.type_() == mime_guess::mime::VIDEO => MediaKind::Video,
            _ => MediaKind::File,
        }
    }
}

/// Reduce a client-supplied name to a single safe path component
///
/// Directory parts, `..`, control characters and leading dots are dropped.
pub fn sanitize_file_name(name: &str) -> Result<String, StorageError> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                '_'
            } else {
                c
            }
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();

    if cleaned.is_empty() {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(cleaned)
}

/// Validate a folder name (a single path component of `[A-Za-z0-9_-]`)
pub fn validate_folder(folder: &str) -> Result<(), StorageError> {
    if folder.is_empty()
        || !folder
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(StorageError::InvalidName(folder.to_string()));
    }
    Ok(())
}
