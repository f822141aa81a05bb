//! # Host Bridge Traits
//!
//! Collaborator contracts between the note mirroring core and everything it
//! treats as external.
//!
//! ## Overview
//!
//! The reconciliation engine in `core-sync` owns naming, identity and the
//! create/update/skip/delete decisions. Everything else is injected through
//! the traits in this crate:
//!
//! ### Remote side
//! - [`NoteSource`](notes::NoteSource) - Lists the remote note collection (auth lives here)
//! - [`MediaFetcher`](notes::MediaFetcher) - Transfers media blob bytes
//!
//! ### Content
//! - [`ContentMaterializer`](notes::ContentMaterializer) - Makes a note's media available locally
//! - [`DocumentRenderer`](notes::DocumentRenderer) - Renders the document body for a note
//!
//! ### Local side
//! - [`FileSystemAccess`](storage::FileSystemAccess) - File I/O against the output tree
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert their native errors and keep file paths or note ids in the
//! message so the sync log stays actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single implementation can be
//! shared behind an `Arc` by the coordinator and its helpers.

pub mod error;
pub mod logging;
pub mod notes;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use logging::{LogEntry, LogLevel, LoggerSink};
pub use notes::{
    ContentMaterializer, DocumentRenderer, MaterializedMedia, MediaFetcher, MediaKind, NoteLink,
    NoteSource, NoteTimestamps, RemoteMedia, RemoteNote,
};
pub use storage::{FileMetadata, FileSystemAccess};
