//! Moves an existing note file to its newly allocated name.
//!
//! A failed move is never an error for the run: the note keeps its old file
//! and the caller keeps tracking that path.

use bridge_traits::FileSystemAccess;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::index::LocalNote;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The note had no local file yet; it will simply be written at the target
    NotTracked(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
    /// The move did not happen and the note stays where it was
    Kept { path: PathBuf, reason: String },
}

impl RenameOutcome {
    /// Path the note lives at after the attempt
    pub fn effective_path(&self) -> &Path {
        match self {
            RenameOutcome::NotTracked(path) => path,
            RenameOutcome::Renamed { to, .. } => to,
            RenameOutcome::Kept { path, .. } => path,
        }
    }
}

pub async fn try_rename(
    fs: &dyn FileSystemAccess,
    note: &LocalNote,
    target: &Path,
) -> RenameOutcome {
    let Some(current) = note.path.as_deref() else {
        return RenameOutcome::NotTracked(target.to_path_buf());
    };

    let kept = |reason: String| {
        warn!(
            note_id = %note.remote_id,
            path = ?current,
            target = ?target,
            reason = %reason,
            "Unable to rename note, using existing name"
        );
        RenameOutcome::Kept {
            path: current.to_path_buf(),
            reason,
        }
    };

    // Never overwrite: the target must still be free at the moment of the move
    match fs.exists(target).await {
        Ok(false) => {}
        Ok(true) => return kept("target file exists".to_string()),
        Err(e) => return kept(e.to_string()),
    }

    info!(note_id = %note.remote_id, from = ?current, to = ?target, "Renaming note");
    match fs.rename(current, target).await {
        Ok(()) => RenameOutcome::Renamed {
            from: current.to_path_buf(),
            to: target.to_path_buf(),
        },
        Err(e) => kept(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result;
    use bridge_traits::storage::FileMetadata;
    use bridge_traits::BridgeError;
    use bytes::Bytes;
    use mockall::mock;

    mock! {
        Fs {}

        #[async_trait]
        impl FileSystemAccess for Fs {
            async fn exists(&self, path: &Path) -> Result<bool>;
            async fn metadata(&self, path: &Path) -> Result<FileMetadata>;
            async fn create_dir_all(&self, path: &Path) -> Result<()>;
            async fn read_file(&self, path: &Path) -> Result<Bytes>;
            async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;
            async fn rename(&self, from: &Path, to: &Path) -> Result<()>;
            async fn delete_file(&self, path: &Path) -> Result<()>;
            async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;
        }
    }

    fn tracked(path: &str) -> LocalNote {
        let mut note = LocalNote::new("id1");
        note.path = Some(PathBuf::from(path));
        note
    }

    #[tokio::test]
    async fn test_untracked_note_is_not_renamed() {
        let fs = MockFs::new();
        let outcome = try_rename(&fs, &LocalNote::new("id1"), Path::new("/out/new.md")).await;

        assert_eq!(outcome, RenameOutcome::NotTracked(PathBuf::from("/out/new.md")));
    }

    #[tokio::test]
    async fn test_successful_rename() {
        let mut fs = MockFs::new();
        fs.expect_exists().returning(|_| Ok(false));
        fs.expect_rename()
            .withf(|from, to| from.ends_with("old.md") && to.ends_with("new.md"))
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = try_rename(&fs, &tracked("/out/old.md"), Path::new("/out/new.md")).await;

        assert_eq!(
            outcome,
            RenameOutcome::Renamed {
                from: PathBuf::from("/out/old.md"),
                to: PathBuf::from("/out/new.md"),
            }
        );
        assert_eq!(outcome.effective_path(), Path::new("/out/new.md"));
    }

    #[tokio::test]
    async fn test_failed_rename_keeps_original_path() {
        let mut fs = MockFs::new();
        fs.expect_exists().returning(|_| Ok(false));
        fs.expect_rename()
            .returning(|_, _| Err(BridgeError::OperationFailed("permission denied".to_string())));

        let outcome = try_rename(&fs, &tracked("/out/old.md"), Path::new("/out/new.md")).await;

        match &outcome {
            RenameOutcome::Kept { path, reason } => {
                assert_eq!(path, Path::new("/out/old.md"));
                assert!(reason.contains("permission denied"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(outcome.effective_path(), Path::new("/out/old.md"));
    }

    #[tokio::test]
    async fn test_occupied_target_is_never_overwritten() {
        let mut fs = MockFs::new();
        fs.expect_exists().returning(|_| Ok(true));
        fs.expect_rename().never();

        let outcome = try_rename(&fs, &tracked("/out/old.md"), Path::new("/out/new.md")).await;

        assert!(matches!(outcome, RenameOutcome::Kept { .. }));
    }
}
