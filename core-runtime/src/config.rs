//! # Export Configuration Module
//!
//! Provides the configuration surface for a mirroring run.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct an
//! `ExportConfig` holding the output location, naming options, the
//! destructive-operation switches and the file system bridge. It fails fast:
//! an invalid date format or a missing file system is reported at build time,
//! before a run touches the disk.
//!
//! ## Required Settings
//!
//! - `output_dir` - Root of the mirrored directory tree
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `FileSystemAccess` - File I/O (desktop default: tokio fs)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ExportConfig;
//!
//! let config = ExportConfig::builder()
//!     .output_dir("/home/me/keep")
//!     .date_format("%Y%m%d")
//!     .rename_local(true)
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::ExportConfig;
//!
//! let config = ExportConfig::builder()
//!     .build()
//!     .expect("Should fail - output directory missing");
//! ```

use crate::error::{Error, Result};
use bridge_traits::FileSystemAccess;
use chrono::format::{Item, StrftimeItems};
use std::path::PathBuf;
use std::sync::Arc;

/// Default strftime pattern for the date prefix of note filenames
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Name of the media directory below the output root
pub const MEDIA_DIR_NAME: &str = "media";

/// Configuration for one mirroring run.
///
/// Use [`ExportConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct ExportConfig {
    /// Root of the mirrored directory tree
    pub output_dir: PathBuf,

    /// strftime pattern applied to a note's creation time
    pub date_format: String,

    /// Delete local notes and media that no longer exist remotely
    pub delete_local: bool,

    /// Move existing note files to their current canonical name
    pub rename_local: bool,

    /// Do not transfer media already present locally with a matching size
    pub skip_existing_media: bool,

    /// Prefix written notes with the YAML metadata header
    pub write_header: bool,

    /// File system the run operates on
    pub file_system: Arc<dyn FileSystemAccess>,
}

impl std::fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportConfig")
            .field("output_dir", &self.output_dir)
            .field("date_format", &self.date_format)
            .field("delete_local", &self.delete_local)
            .field("rename_local", &self.rename_local)
            .field("skip_existing_media", &self.skip_existing_media)
            .field("write_header", &self.write_header)
            .field("file_system", &"FileSystemAccess { ... }")
            .finish()
    }
}

impl ExportConfig {
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder::default()
    }

    /// Directory holding per-note media subdirectories
    pub fn media_dir(&self) -> PathBuf {
        self.output_dir.join(MEDIA_DIR_NAME)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Output directory is not empty
    /// - Date format is a non-empty, well-formed strftime pattern
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::Config(
                "Output directory cannot be empty".to_string(),
            ));
        }

        if self.date_format.is_empty() {
            return Err(Error::Config(
                "Date format cannot be empty. Use a strftime pattern such as \"%Y-%m-%d\"."
                    .to_string(),
            ));
        }

        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::Config(format!(
                "Date format \"{}\" is not a valid strftime pattern",
                self.date_format
            )));
        }

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    use bridge_desktop::TokioFileSystem;

    let fs: Arc<dyn FileSystemAccess> = Arc::new(TokioFileSystem::new());
    Ok(fs)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Err(Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "FileSystemAccess implementation is required to read and write the output tree. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default TokioFileSystem. \
                 Otherwise inject an implementation with .file_system()."
            .to_string(),
    })
}

/// Builder for constructing [`ExportConfig`] instances.
#[derive(Default)]
pub struct ExportConfigBuilder {
    output_dir: Option<PathBuf>,
    date_format: Option<String>,
    delete_local: bool,
    rename_local: bool,
    skip_existing_media: Option<bool>,
    write_header: Option<bool>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
}

impl ExportConfigBuilder {
    /// Sets the root of the mirrored directory tree (required).
    pub fn output_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Sets the strftime pattern for the filename date prefix.
    ///
    /// Defaults to `%Y-%m-%d`.
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    pub fn delete_local(mut self, enabled: bool) -> Self {
        self.delete_local = enabled;
        self
    }

    pub fn rename_local(mut self, enabled: bool) -> Self {
        self.rename_local = enabled;
        self
    }

    /// Defaults to `true`.
    pub fn skip_existing_media(mut self, enabled: bool) -> Self {
        self.skip_existing_media = Some(enabled);
        self
    }

    /// Defaults to `true`.
    pub fn write_header(mut self, enabled: bool) -> Self {
        self.write_header = Some(enabled);
        self
    }

    /// Sets the file system implementation (optional with desktop default).
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Builds the configuration, filling in defaults and validating.
    pub fn build(self) -> Result<ExportConfig> {
        let output_dir = self.output_dir.ok_or_else(|| {
            Error::Config("Output directory is required. Use .output_dir() to set it.".to_string())
        })?;

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system()?,
        };

        let config = ExportConfig {
            output_dir,
            date_format: self
                .date_format
                .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
            delete_local: self.delete_local,
            rename_local: self.rename_local,
            skip_existing_media: self.skip_existing_media.unwrap_or(true),
            write_header: self.write_header.unwrap_or(true),
            file_system,
        };

        config.validate()?;

        Ok(config)
    }
}
