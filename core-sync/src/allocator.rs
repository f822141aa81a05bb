//! # Unique Path Allocator
//!
//! Decides which file a remote note should live in.
//!
//! The canonical name is `"<date> - <title>.md"`. A note that already has a
//! local file keeps it when the canonical name is taken by some other file;
//! renaming into a collision would make two notes trade names on every run.
//! Otherwise collisions are resolved with `.<remote-id>.<n>` suffixes, `n`
//! counting up from 1.
//!
//! Allocation never touches the disk beyond existence checks.

use bridge_traits::{FileSystemAccess, RemoteNote};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::Result;
use crate::index::LocalIndex;
use crate::naming::{canonical_stem, deduplicated_file_name, note_file_name};

/// Where a note should be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathAllocation {
    /// The note's current file already has the canonical name
    Unchanged(PathBuf),
    /// The canonical name belongs to another file, keep the current one
    KeepExisting {
        path: PathBuf,
        blocked_target: PathBuf,
    },
    /// A free path: the canonical name or a deduplicated variant
    Target(PathBuf),
}

impl PathAllocation {
    pub fn path(&self) -> &Path {
        match self {
            PathAllocation::Unchanged(path)
            | PathAllocation::KeepExisting { path, .. }
            | PathAllocation::Target(path) => path,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            PathAllocation::Unchanged(path)
            | PathAllocation::KeepExisting { path, .. }
            | PathAllocation::Target(path) => path,
        }
    }
}

pub struct PathAllocator {
    fs: Arc<dyn FileSystemAccess>,
}

impl PathAllocator {
    pub fn new(fs: Arc<dyn FileSystemAccess>) -> Self {
        Self { fs }
    }

    pub async fn allocate(
        &self,
        root: &Path,
        note: &RemoteNote,
        date_format: &str,
        index: &LocalIndex,
    ) -> Result<PathAllocation> {
        let stem = canonical_stem(note, date_format)?;
        let canonical = root.join(note_file_name(&stem));

        if let Some(current) = index.note_path(&note.id) {
            if current == canonical {
                return Ok(PathAllocation::Unchanged(canonical));
            }

            if self.fs.exists(&canonical).await? {
                info!(
                    note_id = %note.id,
                    target = ?canonical,
                    "Note will not be renamed, target file exists"
                );
                return Ok(PathAllocation::KeepExisting {
                    path: current.to_path_buf(),
                    blocked_target: canonical,
                });
            }
        }

        let mut target = canonical;
        let mut n = 1;
        while self.fs.exists(&target).await? {
            target = root.join(deduplicated_file_name(&stem, &note.id, n));
            n += 1;
        }

        debug!(note_id = %note.id, target = ?target, "Allocated note path");
        Ok(PathAllocation::Target(target))
    }
}
