//! # Sync Coordinator
//!
//! Drives one mirroring pass from the remote note collection into the output
//! directory.
//!
//! ## Workflow
//!
//! 1. Create the output root and its `media/` directory (fatal on failure)
//! 2. Scan the output tree into a [`LocalIndex`]
//! 3. Fetch the remote note collection (fatal on failure)
//! 4. Report, and optionally delete, local notes and media missing remotely
//! 5. For each remote note, in source order:
//!    - allocate its path, renaming the existing file when enabled
//!    - skip it when the recorded `updated` timestamp matches
//!    - otherwise materialize its media, render and write the document
//! 6. Log the summary and emit [`SyncEvent::Completed`]
//!
//! A failure on one note is logged and counted; the run carries on with the
//! next note. Running twice without remote changes writes nothing the second
//! time.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_runtime::ExportConfig;
//! use core_sync::SyncCoordinator;
//! use std::sync::Arc;
//!
//! # async fn example(source: Arc<dyn bridge_traits::NoteSource>,
//! #                  fetcher: Arc<dyn bridge_traits::MediaFetcher>,
//! #                  renderer: Arc<dyn bridge_traits::DocumentRenderer>)
//! #     -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExportConfig::builder()
//!     .output_dir("/home/me/notes")
//!     .rename_local(true)
//!     .build()?;
//!
//! let coordinator = SyncCoordinator::with_media_fetcher(config, source, fetcher, renderer);
//! let report = coordinator.run().await?;
//! println!("{}", report.notes_summary());
//! # Ok(())
//! # }
//! ```

use bridge_traits::{
    ContentMaterializer, DocumentRenderer, FileSystemAccess, MediaFetcher, NoteSource, RemoteNote,
};
use bytes::Bytes;
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use core_runtime::ExportConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::allocator::{PathAllocation, PathAllocator};
use crate::index::{IndexBuilder, LocalIndex};
use crate::media::MediaDownloader;
use crate::metadata::{compose_document, timestamps_match};
use crate::orphans::reconcile_deletions;
use crate::rename::{try_rename, RenameOutcome};
use crate::report::SyncReport;
use crate::{Result, SyncError};

/// Mirrors a remote note collection into a local directory
pub struct SyncCoordinator {
    config: ExportConfig,
    source: Arc<dyn NoteSource>,
    materializer: Arc<dyn ContentMaterializer>,
    renderer: Arc<dyn DocumentRenderer>,
    event_bus: Option<Arc<EventBus>>,
}

impl SyncCoordinator {
    pub fn new(
        config: ExportConfig,
        source: Arc<dyn NoteSource>,
        materializer: Arc<dyn ContentMaterializer>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        Self {
            config,
            source,
            materializer,
            renderer,
            event_bus: None,
        }
    }

    /// Use the built-in [`MediaDownloader`] on top of `fetcher`
    pub fn with_media_fetcher(
        config: ExportConfig,
        source: Arc<dyn NoteSource>,
        fetcher: Arc<dyn MediaFetcher>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        let materializer = Arc::new(MediaDownloader::new(
            Arc::clone(&config.file_system),
            fetcher,
            config.media_dir(),
            config.skip_existing_media,
        ));
        Self::new(config, source, materializer, renderer)
    }

    /// Publish progress events on `event_bus`
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    fn fs(&self) -> &dyn FileSystemAccess {
        self.config.file_system.as_ref()
    }

    fn emit(&self, event: SyncEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Sync(event)).ok();
        }
    }

    /// Run one full mirroring pass.
    ///
    /// Only setup and remote listing failures abort the run; everything else
    /// is counted in the returned report.
    #[instrument(skip(self), fields(output_dir = %self.config.output_dir.display()))]
    pub async fn run(&self) -> Result<SyncReport> {
        let run_id = Uuid::new_v4().to_string();

        match self.execute(&run_id).await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!(run_id = %run_id, error = %e, "Sync run failed");
                self.emit(SyncEvent::Failed {
                    run_id,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn execute(&self, run_id: &str) -> Result<SyncReport> {
        let started = Instant::now();
        let root = self.config.output_dir.as_path();
        let mut report = SyncReport::default();

        // Phase 1: Output directories
        info!("Phase 1: Preparing output directory {}", root.display());
        self.prepare_directories().await?;
        self.emit(SyncEvent::Started {
            run_id: run_id.to_string(),
            output_dir: root.display().to_string(),
        });

        // Phase 2: Local index
        info!("Phase 2: Indexing local files");
        let (mut index, stats) = IndexBuilder::new(Arc::clone(&self.config.file_system))
            .build(root)
            .await?;
        report.index = stats;
        self.emit(SyncEvent::IndexBuilt {
            run_id: run_id.to_string(),
            notes: stats.notes,
            media: stats.media,
            unknown: stats.unknown,
            errors: stats.errors,
        });

        // Phase 3: Remote collection
        info!("Phase 3: Fetching remote notes");
        let notes = self
            .source
            .fetch_all_notes()
            .await
            .map_err(SyncError::Source)?;
        info!(count = notes.len(), "Fetched {} remote notes", notes.len());

        // Phase 4: Orphans
        info!("Phase 4: Reconciling local-only notes and media");
        let deletions =
            reconcile_deletions(self.fs(), &mut index, &notes, self.config.delete_local).await;
        report.record_deletions(&deletions);
        if deletions.notes_orphaned > 0 || deletions.media_orphaned > 0 {
            self.emit(SyncEvent::OrphansDetected {
                run_id: run_id.to_string(),
                notes: deletions.notes_orphaned,
                media: deletions.media_orphaned,
                delete_enabled: self.config.delete_local,
            });
        }

        // Phase 5: Notes
        info!("Phase 5: Syncing {} notes", notes.len());
        let allocator = PathAllocator::new(Arc::clone(&self.config.file_system));
        for note in &notes {
            if let Err(e) = self
                .sync_note(run_id, note, &allocator, &mut index, &mut report)
                .await
            {
                error!(note_id = %note.id, title = %note.title, error = %e, "Failed to sync note");
                report.notes_failed += 1;
            }
        }

        // Phase 6: Summary
        info!("{}", report.notes_summary());
        info!("{}", report.media_summary());
        if report.deletion_failures > 0 {
            warn!("{} local files could not be deleted", report.deletion_failures);
        }

        self.emit(SyncEvent::Completed {
            run_id: run_id.to_string(),
            notes_new: report.notes_new,
            notes_updated: report.notes_updated,
            notes_skipped: report.notes_skipped,
            notes_deleted: report.notes_deleted,
            notes_failed: report.notes_failed,
            media_downloaded: report.media_downloaded,
            media_deleted: report.media_deleted,
            duration_secs: started.elapsed().as_secs(),
        });

        Ok(report)
    }

    async fn prepare_directories(&self) -> Result<()> {
        for dir in [self.config.output_dir.clone(), self.config.media_dir()] {
            self.fs()
                .create_dir_all(&dir)
                .await
                .map_err(|source| SyncError::Setup {
                    path: dir.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    #[instrument(skip_all, fields(note_id = %note.id))]
    async fn sync_note(
        &self,
        run_id: &str,
        note: &RemoteNote,
        allocator: &PathAllocator,
        index: &mut LocalIndex,
        report: &mut SyncReport,
    ) -> Result<()> {
        let current = index.note_path(&note.id).map(Path::to_path_buf);
        let recorded = index.get(&note.id).and_then(|local| local.updated);

        let allocation = allocator
            .allocate(&self.config.output_dir, note, &self.config.date_format, index)
            .await?;

        let path = match (current.as_deref(), allocation) {
            (Some(current), PathAllocation::Target(target))
                if self.config.rename_local && target != current =>
            {
                self.rename_note(run_id, note, target, index, report).await
            }
            (Some(current), _) => current.to_path_buf(),
            (None, allocation) => allocation.into_path(),
        };

        let is_new = current.is_none();
        if !is_new && recorded.is_some_and(|at| timestamps_match(at, note.timestamps.updated)) {
            debug!(path = ?path, "Note unchanged, skipping");
            report.notes_skipped += 1;
            return Ok(());
        }

        let media = self.materializer.materialize_content(note).await?;
        report.media_downloaded += media.downloaded;

        let body = self.renderer.render_document(note, &media.paths)?;
        let document = if self.config.write_header {
            compose_document(note, &body)?
        } else {
            body
        };

        self.fs().write_file(&path, Bytes::from(document)).await?;
        index.register_note(&note.id, path.clone(), Some(note.timestamps.updated));

        if is_new {
            info!(path = ?path, "Created note");
            report.notes_new += 1;
        } else {
            info!(path = ?path, "Updated note");
            report.notes_updated += 1;
        }

        self.emit(SyncEvent::NoteWritten {
            run_id: run_id.to_string(),
            note_id: note.id.clone(),
            path: path.display().to_string(),
            is_new,
        });

        Ok(())
    }

    /// Move the note's file to `target`; on failure the old path is kept
    async fn rename_note(
        &self,
        run_id: &str,
        note: &RemoteNote,
        target: PathBuf,
        index: &mut LocalIndex,
        report: &mut SyncReport,
    ) -> PathBuf {
        let outcome = match index.get(&note.id) {
            Some(local) => try_rename(self.fs(), local, &target).await,
            None => RenameOutcome::NotTracked(target),
        };

        if let RenameOutcome::Renamed { from, to } = &outcome {
            index.move_note(&note.id, to.clone());
            report.notes_renamed += 1;
            self.emit(SyncEvent::NoteRenamed {
                run_id: run_id.to_string(),
                note_id: note.id.clone(),
                from: from.display().to_string(),
                to: to.display().to_string(),
            });
        }

        outcome.effective_path().to_path_buf()
    }
}
