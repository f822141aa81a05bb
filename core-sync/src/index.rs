//! # Local Index
//!
//! In-memory view of what already exists in the output tree, keyed by remote
//! note id. Rebuilt from scratch at the start of every run by scanning the
//! directory; there is no persisted index.
//!
//! ## Recognized files
//!
//! - `*.md` anywhere below the root: note files, identified by the
//!   `google_keep_id` field of their metadata header
//! - `<root>/media/<note-id>/<file>`: media files; the parent directory names
//!   the owning note and the file stem is the media id
//!
//! Anything else is counted as unknown and left alone.
//!
//! ## Duplicates
//!
//! When two note files claim the same id, the one scanned last wins and a
//! warning naming both files is always logged. Scan order follows the file
//! system and is not stable across platforms.

use bridge_traits::FileSystemAccess;
use chrono::{DateTime, Utc};
use core_runtime::config::MEDIA_DIR_NAME;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SyncError};
use crate::metadata::parse_metadata_bytes;
use crate::naming::{is_note_file, media_id_from_path};

/// A media file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalMedia {
    pub path: PathBuf,
    pub note_id: String,
    pub media_id: String,
}

/// Everything known locally about one remote note id
#[derive(Debug, Clone, PartialEq)]
pub struct LocalNote {
    pub remote_id: String,
    /// Note file, absent when only media exists for this id
    pub path: Option<PathBuf>,
    /// `updated` timestamp recorded in the note file header
    pub updated: Option<DateTime<Utc>>,
    pub media: HashMap<String, LocalMedia>,
}

impl LocalNote {
    pub fn new(remote_id: impl Into<String>) -> Self {
        Self {
            remote_id: remote_id.into(),
            path: None,
            updated: None,
            media: HashMap::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.path.is_none() && self.media.is_empty()
    }
}

/// Remote id → local records
#[derive(Debug, Clone, Default)]
pub struct LocalIndex {
    notes: BTreeMap<String, LocalNote>,
}

impl LocalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, remote_id: &str) -> Option<&LocalNote> {
        self.notes.get(remote_id)
    }

    pub fn contains(&self, remote_id: &str) -> bool {
        self.notes.contains_key(remote_id)
    }

    /// Current note file for `remote_id`, if one is tracked
    pub fn note_path(&self, remote_id: &str) -> Option<&Path> {
        self.notes.get(remote_id)?.path.as_deref()
    }

    fn entry(&mut self, remote_id: &str) -> &mut LocalNote {
        self.notes
            .entry(remote_id.to_string())
            .or_insert_with(|| LocalNote::new(remote_id))
    }

    /// Track `path` as the note file for `remote_id`.
    ///
    /// Returns the path previously tracked for that id, if any.
    pub fn register_note(
        &mut self,
        remote_id: &str,
        path: PathBuf,
        updated: Option<DateTime<Utc>>,
    ) -> Option<PathBuf> {
        let note = self.entry(remote_id);
        note.updated = updated;
        note.path.replace(path)
    }

    /// Point an already tracked note at its new location
    pub fn move_note(&mut self, remote_id: &str, path: PathBuf) {
        self.entry(remote_id).path = Some(path);
    }

    pub fn register_media(&mut self, media: LocalMedia) {
        self.entry(&media.note_id)
            .media
            .insert(media.media_id.clone(), media);
    }

    /// Forget a note file that was deleted; its media stays indexed
    pub fn forget_note_file(&mut self, remote_id: &str) {
        if let Some(note) = self.notes.get_mut(remote_id) {
            note.path = None;
            note.updated = None;
        }
        self.prune(remote_id);
    }

    pub fn forget_media(&mut self, note_id: &str, media_id: &str) {
        if let Some(note) = self.notes.get_mut(note_id) {
            note.media.remove(media_id);
        }
        self.prune(note_id);
    }

    fn prune(&mut self, remote_id: &str) {
        if self.notes.get(remote_id).is_some_and(LocalNote::is_empty) {
            self.notes.remove(remote_id);
        }
    }

    /// All known ids, in sorted order
    pub fn note_ids(&self) -> impl Iterator<Item = &str> {
        self.notes.keys().map(String::as_str)
    }

    pub fn notes(&self) -> impl Iterator<Item = &LocalNote> {
        self.notes.values()
    }

    /// Every indexed media file
    pub fn media(&self) -> impl Iterator<Item = &LocalMedia> {
        self.notes.values().flat_map(|note| note.media.values())
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Counters produced while scanning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Note files with a remote id
    pub notes: u64,
    /// Files the engine could not attribute to a remote id
    pub unknown: u64,
    pub media: u64,
    /// Note files that could not be read or parsed
    pub errors: u64,
    /// Note files that claimed an id already claimed by another file
    pub duplicates: u64,
}

/// Scans an output tree into a [`LocalIndex`]
pub struct IndexBuilder {
    fs: Arc<dyn FileSystemAccess>,
}

impl IndexBuilder {
    pub fn new(fs: Arc<dyn FileSystemAccess>) -> Self {
        Self { fs }
    }

    /// Scan every regular file below `root`.
    ///
    /// Unreadable or malformed note files are counted in `errors` and skipped;
    /// only a failure to list the tree itself is returned as an error.
    #[instrument(skip(self), fields(root = %root.display()))]
    pub async fn build(&self, root: &Path) -> Result<(LocalIndex, IndexStats)> {
        let mut index = LocalIndex::new();
        let mut stats = IndexStats::default();

        let files = self
            .fs
            .walk_files(root)
            .await
            .map_err(|source| SyncError::Scan {
                path: root.to_path_buf(),
                source,
            })?;

        for file in files {
            if is_note_file(&file) {
                self.index_note_file(&file, &mut index, &mut stats).await;
            } else if let Some(media) = media_location(root, &file) {
                debug!(path = ?file, note_id = %media.note_id, "Indexed media file");
                stats.media += 1;
                index.register_media(media);
            } else {
                debug!(path = ?file, "Ignoring unrecognized file");
                stats.unknown += 1;
            }
        }

        info!(
            notes = stats.notes,
            unknown = stats.unknown,
            media = stats.media,
            errors = stats.errors,
            "Indexed local files: {} notes, {} unknown files, {} media files, {} errors",
            stats.notes,
            stats.unknown,
            stats.media,
            stats.errors
        );

        Ok((index, stats))
    }

    async fn index_note_file(&self, file: &Path, index: &mut LocalIndex, stats: &mut IndexStats) {
        let bytes = match self.fs.read_file(file).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = ?file, error = %e, "Unable to read note file, skipping");
                stats.errors += 1;
                return;
            }
        };

        let metadata = match parse_metadata_bytes(&bytes) {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                debug!(path = ?file, "Note file has no metadata header");
                stats.unknown += 1;
                return;
            }
            Err(e) => {
                warn!(path = ?file, error = %e, "Unable to parse note metadata, skipping");
                stats.errors += 1;
                return;
            }
        };

        let Some(remote_id) = metadata.remote_id else {
            debug!(path = ?file, "Note metadata has no remote id");
            stats.unknown += 1;
            return;
        };

        stats.notes += 1;
        if let Some(previous) = index.register_note(&remote_id, file.to_path_buf(), metadata.updated)
        {
            stats.duplicates += 1;
            warn!(
                note_id = %remote_id,
                kept = ?file,
                ignored = ?previous,
                "Same remote id in multiple files; only the last scanned file will be updated"
            );
        }
    }
}

/// Interpret `file` as `<root>/media/<note-id>/<media file>`
fn media_location(root: &Path, file: &Path) -> Option<LocalMedia> {
    let relative = file.strip_prefix(root).ok()?;
    let mut components = relative.components();

    let media_dir = components.next()?.as_os_str();
    let note_dir = components.next()?.as_os_str().to_str()?;
    let _file_name = components.next()?;
    if components.next().is_some() || media_dir != MEDIA_DIR_NAME {
        return None;
    }

    Some(LocalMedia {
        path: file.to_path_buf(),
        note_id: note_dir.to_string(),
        media_id: media_id_from_path(file)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::TokioFileSystem;
    use bytes::Bytes;

    async fn write(fs: &TokioFileSystem, path: PathBuf, content: &str) {
        fs.write_file(&path, Bytes::from(content.to_string()))
            .await
            .unwrap();
    }

    fn header(id: &str, updated: f64) -> String {
        format!("---\ngoogle_keep_id: {id}\ntitle: t\ntimestamps:\n  updated: {updated}\n---\n\nbody\n")
    }

    #[tokio::test]
    async fn test_build_index_counts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let fs = TokioFileSystem::new();

        write(&fs, root.join("2024-01-01 - A.md"), &header("a", 100.0)).await;
        write(&fs, root.join("loose.md"), "# no header\n").await;
        write(&fs, root.join("broken.md"), "---\ngoogle_keep_id: [x\n---\n").await;
        write(&fs, root.join("media/a/m1.png"), "png").await;
        write(&fs, root.join("media/b/m2.3gp"), "3gp").await;
        write(&fs, root.join("notes.txt"), "stray").await;

        let builder = IndexBuilder::new(Arc::new(fs));
        let (index, stats) = builder.build(root).await.unwrap();

        assert_eq!(
            stats,
            IndexStats {
                notes: 1,
                unknown: 2,
                media: 2,
                errors: 1,
                duplicates: 0,
            }
        );

        let a = index.get("a").unwrap();
        assert_eq!(a.path.as_deref(), Some(root.join("2024-01-01 - A.md").as_path()));
        assert_eq!(a.updated, DateTime::from_timestamp(100, 0));
        assert_eq!(a.media["m1"].path, root.join("media/a/m1.png"));

        // media-only entry
        let b = index.get("b").unwrap();
        assert_eq!(b.path, None);
        assert_eq!(b.media["m2"].note_id, "b");
    }

    #[tokio::test]
    async fn test_duplicate_ids_last_scanned_wins() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let fs = TokioFileSystem::new();

        write(&fs, root.join("one.md"), &header("dup", 100.0)).await;
        write(&fs, root.join("two.md"), &header("dup", 200.0)).await;

        let (index, stats) = IndexBuilder::new(Arc::new(fs)).build(root).await.unwrap();

        assert_eq!(stats.notes, 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(index.len(), 1);

        // Either file may win depending on traversal order
        let winner = index.note_path("dup").unwrap();
        assert!(winner == root.join("one.md") || winner == root.join("two.md"));
    }

    #[tokio::test]
    async fn test_media_outside_media_dir_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let fs = TokioFileSystem::new();

        write(&fs, root.join("attachments/x/m1.png"), "png").await;
        write(&fs, root.join("media/x/deep/m1.png"), "png").await;

        let (index, stats) = IndexBuilder::new(Arc::new(fs)).build(root).await.unwrap();

        assert!(index.is_empty());
        assert_eq!(stats.unknown, 2);
        assert_eq!(stats.media, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_do_not_abort_the_scan() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let fs = TokioFileSystem::new();

        write(&fs, root.join("a.md"), &header("a", 100.0)).await;
        write(&fs, root.join("media/a/m1.png"), "png").await;
        symlink(root.join("nowhere.png"), root.join("dangling.png")).unwrap();
        symlink(root, root.join("media/a/loop")).unwrap();

        let (index, stats) = IndexBuilder::new(Arc::new(fs)).build(root).await.unwrap();

        assert_eq!(stats.notes, 1);
        assert_eq!(stats.media, 1);
        assert_eq!(stats.errors, 0);
        assert!(index.note_path("a").is_some());
    }

    #[tokio::test]
    async fn test_missing_root_is_a_scan_error() {
        let dir = tempfile::tempdir().unwrap();
        let builder = IndexBuilder::new(Arc::new(TokioFileSystem::new()));

        let err = builder.build(&dir.path().join("absent")).await.unwrap_err();
        assert!(matches!(err, SyncError::Scan { .. }));
    }

    #[test]
    fn test_forget_prunes_empty_entries() {
        let mut index = LocalIndex::new();
        index.register_note("a", PathBuf::from("/out/a.md"), None);
        index.register_media(LocalMedia {
            path: PathBuf::from("/out/media/a/m1.png"),
            note_id: "a".to_string(),
            media_id: "m1".to_string(),
        });

        index.forget_note_file("a");
        assert!(index.contains("a"));
        assert_eq!(index.note_path("a"), None);

        index.forget_media("a", "m1");
        assert!(!index.contains("a"));
    }
}
