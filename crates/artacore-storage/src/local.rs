//! Local disk storage backend

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::backend::{StorageBackend, StoredFile, sanitize_file_name, validate_folder};
use crate::error::StorageError;

/// Local disk storage backend
///
/// Stores files as `<base_path>/<folder>/<millis>-<seq>-<name>` and reports
/// them under `<public_prefix>/<folder>/<millis>-<seq>-<name>`. `seq` is a
/// per-instance counter, so saves within the same millisecond never collide.
pub struct LocalStorage {
    base_path: PathBuf,
    public_prefix: String,
    sequence: AtomicU64,
}

impl LocalStorage {
    /// Create a new local storage backend
    pub async fn new(
        base_path: impl AsRef<Path>,
        public_prefix: &str,
    ) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();

        fs::create_dir_all(&base_path).await?;

        info!("Initialized local storage at {:?}", base_path);

        Ok(Self {
            base_path,
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
            sequence: AtomicU64::new(0),
        })
    }

    /// Get the file path for a stored file
    fn file_path(&self, folder: &str, file_name: &str) -> Result<PathBuf, StorageError> {
        validate_folder(folder)?;
        let safe = sanitize_file_name(file_name)?;
        if safe != file_name {
            return Err(StorageError::InvalidName(file_name.to_string()));
        }
        Ok(self.base_path.join(folder).join(safe))
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn save(
        &self,
        folder: &str,
        original_name: &str,
        data: Bytes,
    ) -> Result<StoredFile, StorageError> {
        validate_folder(folder)?;
        let safe_name = sanitize_file_name(original_name)?;
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let file_name = format!("{}-{}-{}", Utc::now().timestamp_millis(), seq, safe_name);

        let dir = self.base_path.join(folder);
        fs::create_dir_all(&dir).await?;

        let path = dir.join(&file_name);
        debug!("Writing {} bytes to {:?}", data.len(), path);

        // Write atomically using a temp file
        let temp_path = dir.join(format!(".{}.tmp", file_name));
        let written = match fs::write(&temp_path, &data).await {
            Ok(()) => fs::rename(&temp_path, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                warn!("Failed to remove temp file {:?}: {}", temp_path, cleanup);
            }
            return Err(StorageError::Io(e));
        }

        Ok(StoredFile {
            url: format!("{}/{}/{}", self.public_prefix, folder, file_name),
            folder: folder.to_string(),
            size: data.len() as u64,
            file_name,
        })
    }

    async fn delete(&self, folder: &str, file_name: &str) -> Result<bool, StorageError> {
        let path = self.file_path(folder, file_name)?;
        debug!("Deleting file at {:?}", path);

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn root(&self) -> &Path {
        &self.base_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_read_delete() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path(), "/uploads/").await.unwrap();

        let stored = storage
            .save("image", "cat.png", Bytes::from_static(b"png-bytes"))
            .await
            .unwrap();

        assert!(stored.file_name.ends_with("-cat.png"));
        assert_eq!(stored.folder, "image");
        assert_eq!(stored.size, 9);
        assert_eq!(stored.url, format!("/uploads/image/{}", stored.file_name));
        assert!(dir.path().join("image").join(&stored.file_name).exists());

        let data = std::fs::read(dir.path().join("image").join(&stored.file_name)).unwrap();
        assert_eq!(&data[..], b"png-bytes");

        assert!(storage.delete("image", &stored.file_name).await.unwrap());
        assert!(!storage.delete("image", &stored.file_name).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_name_saves_keep_both_files() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path(), "/uploads").await.unwrap();

        let mut names = std::collections::HashSet::new();
        for i in 0..20u8 {
            let stored = storage
                .save("image", "same.png", Bytes::from(vec![i]))
                .await
                .unwrap();
            assert!(names.insert(stored.file_name.clone()));

            let data = std::fs::read(dir.path().join("image").join(&stored.file_name)).unwrap();
            assert_eq!(data, vec![i]);
        }

        let files: Vec<_> = std::fs::read_dir(dir.path().join("image"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(files.len(), 20);
        assert!(files.iter().all(|f| !f.ends_with(".tmp")));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path(), "/uploads").await.unwrap();

        // A directory squatting on the target path makes the rename fail
        let seq = storage.sequence.load(Ordering::Relaxed);
        let millis = Utc::now().timestamp_millis();
        let image_dir = dir.path().join("image");
        for offset in 0..1000 {
            std::fs::create_dir_all(image_dir.join(format!("{}-{}-x.png", millis + offset, seq)))
                .unwrap();
        }

        let result = storage.save("image", "x.png", Bytes::from_static(b"x")).await;
        assert!(matches!(result, Err(StorageError::Io(_))));

        let leftovers = std::fs::read_dir(&image_dir)
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with(".tmp")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_save_cannot_escape_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("uploads");
        let storage = LocalStorage::new(&root, "/uploads").await.unwrap();

        let stored = storage
            .save("file", "../../escape.txt", Bytes::from_static(b"x"))
            .await
            .unwrap();
        assert!(stored.file_name.ends_with("-escape.txt"));
        assert!(root.join("file").join(&stored.file_name).exists());
        assert!(!dir.path().join("escape.txt").exists());

        assert!(storage.save("../etc", "a.txt", Bytes::new()).await.is_err());
        assert!(storage.delete("file", "../../escape.txt").await.is_err());
    }
}
