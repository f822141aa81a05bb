//! Remote Note Model and Content Collaborators
//!
//! Types describing the externally-owned note collection, plus the traits the
//! sync engine uses to reach the remote service and to turn a note into a
//! document on disk. None of these traits are implemented by the engine
//! itself for the network side; hosts inject them.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";
const DEFAULT_AUDIO_MIME: &str = "audio/3gpp";
const FALLBACK_EXTENSION: &str = ".bin";

/// Timestamps carried by a remote note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteTimestamps {
    pub created: DateTime<Utc>,
    pub edited: DateTime<Utc>,
    /// Single source of truth for change detection
    pub updated: DateTime<Utc>,
    pub trashed: Option<DateTime<Utc>>,
    pub deleted: Option<DateTime<Utc>>,
}

impl NoteTimestamps {
    /// Timestamps where created, edited and updated are all `at`
    pub fn at(at: DateTime<Utc>) -> Self {
        Self {
            created: at,
            edited: at,
            updated: at,
            trashed: None,
            deleted: None,
        }
    }
}

/// Link annotation attached to a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteLink {
    pub url: String,
    pub title: String,
}

/// Kind of media blob, with the data needed to pick a file extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaKind {
    Image { mime_type: Option<String> },
    /// Drawings are always exported as PNG snapshots
    Drawing,
    Audio { mime_type: Option<String> },
}

impl MediaKind {
    /// File extension (with leading dot) for this media kind
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Drawing => ".png",
            MediaKind::Image { mime_type } => {
                let mime = mime_type.as_deref().unwrap_or(DEFAULT_IMAGE_MIME);
                match extension_for_mime(mime) {
                    Some(".jpe") => ".jpg",
                    Some(ext) => ext,
                    None => FALLBACK_EXTENSION,
                }
            }
            MediaKind::Audio { mime_type } => {
                let mime = mime_type.as_deref().unwrap_or(DEFAULT_AUDIO_MIME);
                extension_for_mime(mime).unwrap_or(FALLBACK_EXTENSION)
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Image { .. } => "IMAGE",
            MediaKind::Drawing => "DRAWING",
            MediaKind::Audio { .. } => "AUDIO",
        }
    }
}

/// First registered extension for a MIME type.
///
/// JPEG maps to `.jpe`, its first registered extension; images normalize it.
fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let ext = match mime.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => ".jpe",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/bmp" => ".bmp",
        "image/tiff" => ".tiff",
        "image/svg+xml" => ".svg",
        "image/heic" => ".heic",
        "audio/3gpp" => ".3gp",
        "audio/amr" => ".amr",
        "audio/mpeg" | "audio/mp3" => ".mp3",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => ".m4a",
        "audio/aac" => ".aac",
        "audio/ogg" => ".ogg",
        "audio/wav" | "audio/x-wav" | "audio/wave" => ".wav",
        "audio/webm" => ".weba",
        "audio/flac" | "audio/x-flac" => ".flac",
        _ => return None,
    };
    Some(ext)
}

/// A media reference on a remote note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMedia {
    pub id: String,
    pub kind: MediaKind,
    /// Size reported by the remote service, when it reports one
    pub byte_size: Option<u64>,
}

impl RemoteMedia {
    pub fn new(id: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            kind,
            byte_size: None,
        }
    }

    pub fn with_byte_size(mut self, size: u64) -> Self {
        self.byte_size = Some(size);
        self
    }
}

/// A note as listed by the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteNote {
    pub id: String,
    pub title: String,
    pub text: String,
    pub timestamps: NoteTimestamps,
    pub pinned: bool,
    pub trashed: bool,
    pub archived: bool,
    pub color: String,
    pub note_type: String,
    pub parent_id: Option<String>,
    pub sort: Option<i64>,
    pub url: Option<String>,
    pub labels: Vec<String>,
    pub links: Vec<NoteLink>,
    pub media: Vec<RemoteMedia>,
}

impl RemoteNote {
    /// Create a plain text note with default presentation fields
    pub fn new(id: impl Into<String>, title: impl Into<String>, timestamps: NoteTimestamps) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            text: String::new(),
            timestamps,
            pinned: false,
            trashed: false,
            archived: false,
            color: "DEFAULT".to_string(),
            note_type: "NOTE".to_string(),
            parent_id: None,
            sort: None,
            url: None,
            labels: Vec::new(),
            links: Vec::new(),
            media: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_media(mut self, media: RemoteMedia) -> Self {
        self.media.push(media);
        self
    }

    pub fn with_link(mut self, url: impl Into<String>, title: impl Into<String>) -> Self {
        self.links.push(NoteLink {
            url: url.into(),
            title: title.into(),
        });
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }
}

/// Outcome of materializing a note's media locally
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializedMedia {
    /// Local path of every media item, in the note's media order
    pub paths: Vec<PathBuf>,
    /// How many of those were actually transferred this time
    pub downloaded: u64,
}

/// Lists the remote note collection
///
/// Authentication and session handling live behind this trait.
#[async_trait]
pub trait NoteSource: Send + Sync {
    /// Fetch every note, including nested media references
    async fn fetch_all_notes(&self) -> Result<Vec<RemoteNote>>;
}

/// Transfers the bytes of a single media blob
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch_media(&self, note_id: &str, media: &RemoteMedia) -> Result<Bytes>;
}

/// Makes a note's media available locally
///
/// Called only for notes that are new or whose `updated` timestamp changed.
#[async_trait]
pub trait ContentMaterializer: Send + Sync {
    async fn materialize_content(&self, note: &RemoteNote) -> Result<MaterializedMedia>;
}

/// Renders the document body for a note
pub trait DocumentRenderer: Send + Sync {
    fn render_document(&self, note: &RemoteNote, media_paths: &[PathBuf]) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drawing_is_always_png() {
        assert_eq!(MediaKind::Drawing.extension(), ".png");
    }

    #[test]
    fn test_image_extension_from_mime() {
        let png = MediaKind::Image {
            mime_type: Some("image/png".to_string()),
        };
        assert_eq!(png.extension(), ".png");

        let jpeg = MediaKind::Image {
            mime_type: Some("image/jpeg".to_string()),
        };
        assert_eq!(jpeg.extension(), ".jpg");

        let default = MediaKind::Image { mime_type: None };
        assert_eq!(default.extension(), ".jpg");
    }

    #[test]
    fn test_audio_extension_from_mime() {
        let default = MediaKind::Audio { mime_type: None };
        assert_eq!(default.extension(), ".3gp");

        let mp3 = MediaKind::Audio {
            mime_type: Some("audio/mpeg".to_string()),
        };
        assert_eq!(mp3.extension(), ".mp3");
    }

    #[test]
    fn test_unknown_mime_falls_back() {
        let odd = MediaKind::Audio {
            mime_type: Some("audio/x-unheard-of".to_string()),
        };
        assert_eq!(odd.extension(), ".bin");
    }

    #[test]
    fn test_remote_note_builder() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let note = RemoteNote::new("abc", "Todo", NoteTimestamps::at(at))
            .with_text("☐ milk")
            .with_media(RemoteMedia::new("m1", MediaKind::Drawing))
            .with_labels(["home"]);

        assert_eq!(note.id, "abc");
        assert_eq!(note.media.len(), 1);
        assert_eq!(note.labels, vec!["home".to_string()]);
        assert_eq!(note.timestamps.updated, at);
    }
}
