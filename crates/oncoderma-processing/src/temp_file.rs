//! Scoped temporary files for uploads under analysis
//!
//! Uploaded bytes are written to a uniquely named file in the upload directory
//! and removed when the owning [`ScopedTempFile`] is dropped. Removal therefore
//! also happens when the request future is cancelled mid-analysis.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use oncoderma_core::validation::unique_storage_name;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone)]
pub struct TempFileManager {
    upload_dir: PathBuf,
}

/// A persisted upload; the file is deleted on drop
#[derive(Debug)]
pub struct ScopedTempFile {
    path: TempPath,
}

impl ScopedTempFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now, reporting the outcome
    pub fn close(self) -> io::Result<()> {
        self.path.close()
    }
}

impl TempFileManager {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Create the upload directory if it does not exist yet
    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await
    }

    /// Write `bytes` to a fresh file named after a random id and the extension
    /// of `original_filename`.
    pub async fn persist(&self, bytes: &[u8], original_filename: &str) -> io::Result<ScopedTempFile> {
        let path = self.upload_dir.join(unique_storage_name(original_filename));

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        // Owned from here on: any early return below removes the partial file
        let scoped = ScopedTempFile {
            path: TempPath::from_path(path),
        };

        file.write_all(bytes).await?;
        file.flush().await?;

        Ok(scoped)
    }

    /// Persist `bytes`, run `f` with the file path, then remove the file.
    ///
    /// The file is gone before this returns, whatever `f` produced. If the
    /// returned future is dropped early, the file is removed on drop.
    pub async fn with_temp<F, Fut, T>(
        &self,
        bytes: &[u8],
        original_filename: &str,
        f: F,
    ) -> io::Result<T>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = T>,
    {
        let scoped = self.persist(bytes, original_filename).await?;
        let output = f(scoped.path().to_path_buf()).await;

        if let Err(e) = scoped.close() {
            tracing::warn!(error = %e, "Failed to remove temporary upload");
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_file_exists_inside_scope_and_is_removed_after() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path());

        let seen = manager
            .with_temp(b"payload", "lesion.png", |path| async move {
                assert!(path.exists());
                assert_eq!(std::fs::read(&path).unwrap(), b"payload");
                path
            })
            .await
            .unwrap();

        assert!(!seen.exists());
        assert_eq!(file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_stored_name_is_random_with_original_extension() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path());

        let scoped = manager.persist(b"x", "../../evil name.PNG").await.unwrap();
        let name = scoped.path().file_name().unwrap().to_str().unwrap().to_string();
        assert_eq!(scoped.path().parent().unwrap(), dir.path());
        assert!(name.ends_with(".png"));
        assert!(!name.contains("evil"));
        drop(scoped);
        assert_eq!(file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_removed_when_scope_fails() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path());

        let outcome: Result<(), &str> = manager
            .with_temp(b"bytes", "a.jpg", |_path| async { Err("validator rejected") })
            .await
            .unwrap();

        assert!(outcome.is_err());
        assert_eq!(file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_removed_when_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path());

        let result = tokio::time::timeout(
            Duration::from_millis(50),
            manager.with_temp(b"bytes", "a.jpg", |_path| std::future::pending::<()>()),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_concurrent_uploads_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path());

        let a = manager.persist(b"a", "same.png").await.unwrap();
        let b = manager.persist(b"b", "same.png").await.unwrap();
        assert_ne!(a.path(), b.path());
        assert_eq!(file_count(dir.path()), 2);
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path().join("not-created"));
        assert!(manager.persist(b"x", "a.png").await.is_err());

        manager.ensure_dir().await.unwrap();
        assert!(manager.persist(b"x", "a.png").await.is_ok());
    }
}
