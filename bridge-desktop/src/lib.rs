//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `FileSystemAccess` using `tokio::fs`
//!
//! The remote note source and media fetcher are always injected by the host;
//! there is no desktop default for them.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::TokioFileSystem;
//! use std::sync::Arc;
//!
//! let config = ExportConfig::builder()
//!     .output_dir("/home/me/keep")
//!     .file_system(Arc::new(TokioFileSystem::new()))
//!     .build()?;
//! ```

mod filesystem;

pub use filesystem::TokioFileSystem;
