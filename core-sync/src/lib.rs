//! # Note Mirroring Engine
//!
//! Reconciles a remote note collection with a local directory of Markdown
//! files across repeated runs.
//!
//! ## Overview
//!
//! There is no database: every run rebuilds its view of the output tree from
//! the metadata headers of the files themselves, then decides per remote note
//! whether to create, update, skip or rename it. Local notes and media that no
//! longer exist remotely are reported and, when enabled, deleted.
//!
//! ## Components
//!
//! - **Metadata** (`metadata`): Reads and writes the YAML header of note files
//! - **Naming** (`naming`): Canonical stems, sanitizing, media file names
//! - **Local Index** (`index`): Scans the output tree into remote id → local records
//! - **Path Allocator** (`allocator`): Collision-free, churn-free note paths
//! - **Rename** (`rename`): Moves note files to their new canonical names
//! - **Orphans** (`orphans`): Local-only notes and media, optional deletion
//! - **Media** (`media`): Default media materializer on top of a `MediaFetcher`
//! - **Sync Coordinator** (`coordinator`): Drives one complete run

pub mod allocator;
pub mod coordinator;
pub mod error;
pub mod index;
pub mod media;
pub mod metadata;
pub mod naming;
pub mod orphans;
pub mod rename;
pub mod report;

pub use allocator::{PathAllocation, PathAllocator};
pub use coordinator::SyncCoordinator;
pub use error::{Result, SyncError};
pub use index::{IndexBuilder, IndexStats, LocalIndex, LocalMedia, LocalNote};
pub use media::MediaDownloader;
pub use metadata::{MetadataError, StoredMetadata};
pub use orphans::{reconcile_deletions, DeletionReport};
pub use rename::{try_rename, RenameOutcome};
pub use report::SyncReport;
