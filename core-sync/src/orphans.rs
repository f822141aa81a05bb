//! # Orphan Detection and Deletion
//!
//! Finds notes and media that exist locally but not in the remote collection.
//! With deletion disabled they are only reported. With deletion enabled their
//! files are removed; a removal that fails is logged, counted and left in
//! place, and the run continues.
//!
//! Notes are handled before media. Deleting a note file does not remove its
//! media directory; the media are judged on their own.

use bridge_traits::{FileSystemAccess, RemoteNote};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{error, info, instrument};

use crate::index::LocalIndex;
use crate::naming::media_file_stem;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionReport {
    /// Local note ids missing remotely
    pub notes_orphaned: u64,
    /// Local media missing remotely
    pub media_orphaned: u64,
    pub notes_deleted: u64,
    pub media_deleted: u64,
    /// Removals that failed
    pub failures: u64,
}

#[instrument(skip_all, fields(delete_enabled = delete_enabled))]
pub async fn reconcile_deletions(
    fs: &dyn FileSystemAccess,
    index: &mut LocalIndex,
    remote_notes: &[RemoteNote],
    delete_enabled: bool,
) -> DeletionReport {
    let mut report = DeletionReport::default();

    let remote_ids: BTreeSet<&str> = remote_notes.iter().map(|note| note.id.as_str()).collect();
    let orphan_notes: Vec<(String, Option<PathBuf>)> = index
        .notes()
        .filter(|note| !remote_ids.contains(note.remote_id.as_str()))
        .map(|note| (note.remote_id.clone(), note.path.clone()))
        .collect();
    report.notes_orphaned = orphan_notes.len() as u64;

    if !orphan_notes.is_empty() {
        if !delete_enabled {
            info!(
                count = orphan_notes.len(),
                "{} notes exist locally but not remotely; enable local deletion to remove them",
                orphan_notes.len()
            );
        } else {
            info!(
                count = orphan_notes.len(),
                "{} notes exist locally but not remotely, deleting local files",
                orphan_notes.len()
            );
            for (note_id, path) in orphan_notes {
                let Some(path) = path else {
                    // media-only: nothing to remove at note level
                    report.notes_deleted += 1;
                    continue;
                };

                info!(note_id = %note_id, path = ?path, "Deleting local-only note");
                match fs.delete_file(&path).await {
                    Ok(()) => {
                        report.notes_deleted += 1;
                        index.forget_note_file(&note_id);
                    }
                    Err(e) => {
                        error!(note_id = %note_id, path = ?path, error = %e, "Failed to delete local note");
                        report.failures += 1;
                    }
                }
            }
        }
    }

    let remote_media: BTreeSet<(&str, String)> = remote_notes
        .iter()
        .flat_map(|note| {
            note.media
                .iter()
                .map(move |media| (note.id.as_str(), media_file_stem(&media.id)))
        })
        .collect();

    let orphan_media: Vec<(String, String, PathBuf)> = index
        .media()
        .filter(|media| {
            !remote_media.contains(&(media.note_id.as_str(), media.media_id.clone()))
        })
        .map(|media| (media.note_id.clone(), media.media_id.clone(), media.path.clone()))
        .collect();
    report.media_orphaned = orphan_media.len() as u64;

    if orphan_media.is_empty() {
        return report;
    }

    if !delete_enabled {
        info!(
            count = orphan_media.len(),
            "{} media files exist locally but not remotely; enable local deletion to remove them",
            orphan_media.len()
        );
        return report;
    }

    for (note_id, media_id, path) in orphan_media {
        info!(note_id = %note_id, media_id = %media_id, path = ?path, "Deleting local-only media");
        match fs.delete_file(&path).await {
            Ok(()) => {
                report.media_deleted += 1;
                index.forget_media(&note_id, &media_id);
            }
            Err(e) => {
                error!(note_id = %note_id, media_id = %media_id, path = ?path, error = %e, "Failed to delete local media");
                report.failures += 1;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::LocalMedia;
    use bridge_desktop::TokioFileSystem;
    use bridge_traits::{MediaKind, NoteTimestamps, RemoteMedia};
    use bytes::Bytes;
    use chrono::DateTime;
    use std::path::Path;

    fn remote(id: &str) -> RemoteNote {
        let at = DateTime::from_timestamp(100, 0).unwrap();
        RemoteNote::new(id, "t", NoteTimestamps::at(at))
    }

    async fn seeded(root: &Path) -> (TokioFileSystem, LocalIndex) {
        let fs = TokioFileSystem::new();
        let mut index = LocalIndex::new();

        for (id, name) in [("keep", "keep.md"), ("gone", "gone.md")] {
            let path = root.join(name);
            fs.write_file(&path, Bytes::from_static(b"x")).await.unwrap();
            index.register_note(id, path, None);
        }
        for (note_id, media_id) in [("keep", "m1"), ("keep", "stale"), ("ghost", "m9")] {
            let path = root.join(format!("media/{note_id}/{media_id}.png"));
            fs.write_file(&path, Bytes::from_static(b"png")).await.unwrap();
            index.register_media(LocalMedia {
                path,
                note_id: note_id.to_string(),
                media_id: media_id.to_string(),
            });
        }

        (fs, index)
    }

    fn remote_set() -> Vec<RemoteNote> {
        vec![remote("keep").with_media(RemoteMedia::new("m1", MediaKind::Drawing))]
    }

    #[tokio::test]
    async fn test_disabled_deletion_only_reports() {
        let dir = tempfile::tempdir().unwrap();
        let (fs, mut index) = seeded(dir.path()).await;

        let report = reconcile_deletions(&fs, &mut index, &remote_set(), false).await;

        assert_eq!(report.notes_orphaned, 2); // "gone" and media-only "ghost"
        assert_eq!(report.media_orphaned, 2); // keep/stale and ghost/m9
        assert_eq!(report.notes_deleted, 0);
        assert_eq!(report.media_deleted, 0);
        assert!(dir.path().join("gone.md").exists());
        assert!(dir.path().join("media/ghost/m9.png").exists());
        assert_eq!(index.len(), 3);
    }

    #[tokio::test]
    async fn test_enabled_deletion_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let (fs, mut index) = seeded(dir.path()).await;

        let report = reconcile_deletions(&fs, &mut index, &remote_set(), true).await;

        assert_eq!(report.notes_deleted, 2);
        assert_eq!(report.media_deleted, 2);
        assert_eq!(report.failures, 0);

        assert!(!dir.path().join("gone.md").exists());
        assert!(!dir.path().join("media/keep/stale.png").exists());
        assert!(!dir.path().join("media/ghost/m9.png").exists());
        assert!(dir.path().join("keep.md").exists());
        assert!(dir.path().join("media/keep/m1.png").exists());

        assert!(!index.contains("gone"));
        assert!(!index.contains("ghost"));
        assert_eq!(index.get("keep").unwrap().media.len(), 1);
    }

    #[tokio::test]
    async fn test_deletion_failure_is_counted_and_tracked() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();
        let mut index = LocalIndex::new();
        // Tracked but already gone from disk, so removal fails
        index.register_note("vanished", dir.path().join("vanished.md"), None);

        let report = reconcile_deletions(&fs, &mut index, &[], true).await;

        assert_eq!(report.notes_deleted, 0);
        assert_eq!(report.failures, 1);
        assert!(index.note_path("vanished").is_some());
    }

    #[tokio::test]
    async fn test_media_ids_with_dots_match_remote() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();
        let mut index = LocalIndex::new();
        index.register_media(LocalMedia {
            path: dir.path().join("media/keep/1a.b2.png"),
            note_id: "keep".to_string(),
            media_id: "1a.b2".to_string(),
        });

        let remote = vec![remote("keep").with_media(RemoteMedia::new("1a.b2", MediaKind::Drawing))];
        let report = reconcile_deletions(&fs, &mut index, &remote, true).await;

        assert_eq!(report.media_orphaned, 0);
    }
}
