//! Storage and File System Abstractions
//!
//! Provides the platform-agnostic file I/O trait the reconciliation engine
//! runs against. The local directory tree is the only ground truth the core
//! has, so every read, write, rename and delete goes through this seam.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// File system access trait
///
/// Abstracts file I/O operations so the sync engine can be exercised against
/// the real disk (`bridge-desktop`) or an in-memory double in tests.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn write_note(fs: &dyn FileSystemAccess, root: &Path, body: &str) -> Result<()> {
///     let path = root.join("2024-01-01 - Todo.md");
///     fs.write_file(&path, Bytes::from(body.to_string())).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Write data to a file, creating or truncating it
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// Move a file to a new location
    ///
    /// Implementations must leave the source untouched when the move fails.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<()>;

    /// List all entries in a directory
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Recursively collect every regular file below `path`
    ///
    /// Only a failure to list `path` itself is an error. Entries below it that
    /// cannot be inspected or listed are skipped. Traversal order follows
    /// `list_directory` and is not guaranteed to be stable across platforms.
    ///
    /// This default follows whatever `metadata` follows; implementations on a
    /// real disk should override it with a walk that does not chase links.
    async fn walk_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut pending = self.list_directory(path).await?;

        while let Some(entry) = pending.pop() {
            match self.metadata(&entry).await {
                Ok(metadata) if metadata.is_directory => {
                    if let Ok(children) = self.list_directory(&entry).await {
                        pending.extend(children);
                    }
                }
                Ok(_) => files.push(entry),
                Err(_) => {}
            }
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    #[test]
    fn test_file_metadata() {
        let metadata = FileMetadata {
            size: 1024,
            modified_at: Some(1234567900),
            is_directory: false,
        };

        assert_eq!(metadata.size, 1024);
        assert!(!metadata.is_directory);
    }

    /// Flat in-memory tree where some entries cannot be inspected
    struct PatchyFs {
        dirs: Vec<(PathBuf, Vec<PathBuf>)>,
        broken: Vec<PathBuf>,
    }

    #[async_trait]
    impl FileSystemAccess for PatchyFs {
        async fn exists(&self, path: &Path) -> Result<bool> {
            Ok(self.dirs.iter().any(|(dir, _)| dir == path))
        }

        async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
            if self.broken.iter().any(|p| p == path) {
                return Err(BridgeError::OperationFailed(format!("{}: broken", path.display())));
            }
            Ok(FileMetadata {
                size: 0,
                modified_at: None,
                is_directory: self.dirs.iter().any(|(dir, _)| dir == path),
            })
        }

        async fn create_dir_all(&self, _path: &Path) -> Result<()> {
            Ok(())
        }

        async fn read_file(&self, _path: &Path) -> Result<Bytes> {
            Ok(Bytes::new())
        }

        async fn write_file(&self, _path: &Path, _data: Bytes) -> Result<()> {
            Ok(())
        }

        async fn rename(&self, _from: &Path, _to: &Path) -> Result<()> {
            Ok(())
        }

        async fn delete_file(&self, _path: &Path) -> Result<()> {
            Ok(())
        }

        async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
            self.dirs
                .iter()
                .find(|(dir, _)| dir == path)
                .map(|(_, entries)| entries.clone())
                .ok_or_else(|| BridgeError::OperationFailed(format!("{}: not a directory", path.display())))
        }
    }

    #[tokio::test]
    async fn test_default_walk_skips_broken_entries() {
        let root = PathBuf::from("/out");
        let fs = PatchyFs {
            dirs: vec![
                (
                    root.clone(),
                    vec![root.join("a.md"), root.join("bad.md"), root.join("media")],
                ),
                (root.join("media"), vec![root.join("media/m1.png")]),
            ],
            broken: vec![root.join("bad.md")],
        };

        let mut files = fs.walk_files(&root).await.unwrap();
        files.sort();
        assert_eq!(files, vec![root.join("a.md"), root.join("media/m1.png")]);

        assert!(fs.walk_files(Path::new("/elsewhere")).await.is_err());
    }
}
