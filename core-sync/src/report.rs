use serde::Serialize;

use crate::index::IndexStats;
use crate::orphans::DeletionReport;

/// Counters for one completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Notes written for the first time.
    ///
    /// A note whose id is only known through files in its media directory
    /// has no note file yet and counts here, not under `notes_updated`.
    /// Counting by presence in the index would report it as updated instead.
    pub notes_new: u64,
    pub notes_updated: u64,
    /// Recorded `updated` matched the remote one
    pub notes_skipped: u64,
    pub notes_renamed: u64,
    pub notes_deleted: u64,
    pub notes_failed: u64,
    pub media_downloaded: u64,
    pub media_deleted: u64,
    pub deletion_failures: u64,
    #[serde(skip)]
    pub index: IndexStats,
}

impl SyncReport {
    pub(crate) fn record_deletions(&mut self, deletions: &DeletionReport) {
        self.notes_deleted = deletions.notes_deleted;
        self.media_deleted = deletions.media_deleted;
        self.deletion_failures = deletions.failures;
    }

    /// Notes whose file was created or rewritten
    pub fn notes_written(&self) -> u64 {
        self.notes_new + self.notes_updated
    }

    /// Whether the run touched the output tree at all
    pub fn is_noop(&self) -> bool {
        self.notes_written() == 0
            && self.notes_renamed == 0
            && self.notes_deleted == 0
            && self.media_downloaded == 0
            && self.media_deleted == 0
    }

    /// Whether anything went wrong along the way
    pub fn has_failures(&self) -> bool {
        self.notes_failed > 0 || self.deletion_failures > 0 || self.index.errors > 0
    }

    /// One-line summary of the note counts
    pub fn notes_summary(&self) -> String {
        format!(
            "Notes: {} new, {} updated, {} unchanged, {} renamed, {} deleted, {} failed",
            self.notes_new,
            self.notes_updated,
            self.notes_skipped,
            self.notes_renamed,
            self.notes_deleted,
            self.notes_failed
        )
    }

    pub fn media_summary(&self) -> String {
        format!(
            "Media: {} downloaded, {} deleted",
            self.media_downloaded, self.media_deleted
        )
    }
}
