//! # Note Metadata Header
//!
//! Reads and writes the YAML block at the top of each note file.
//!
//! The header carries the full presentation metadata of a note, but only three
//! fields are ever read back: `google_keep_id`, `title` and
//! `timestamps.updated`. Everything else is write-only from the engine's point
//! of view.
//!
//! ```text
//! ---
//! google_keep_id: 1a2b3c
//! title: Todo
//! ...
//! timestamps:
//!   created: 1704067200.0
//!   edited: 1704067200.0
//!   updated: 1704070800.5
//! ---
//!
//! # Todo
//! ```

use bridge_traits::RemoteNote;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use serde_yaml::Value;
use thiserror::Error;

const DELIMITER: &str = "---";

/// Identity fields recovered from an existing note file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredMetadata {
    pub remote_id: Option<String>,
    pub title: Option<String>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Note file is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Malformed metadata header: {0}")]
    Malformed(#[source] serde_yaml::Error),

    #[error("Failed to serialize metadata header: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

/// Split a document into its header YAML and body.
///
/// Returns `None` when the document does not open with a `---` line or the
/// block is never closed.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }

    None
}

/// Parse the identity fields from a note document.
///
/// `Ok(None)` means the document has no header at all; a header without an
/// id yields `Ok(Some(..))` with `remote_id` unset. Broken YAML is an error,
/// never an empty record.
pub fn parse_metadata(content: &str) -> Result<Option<StoredMetadata>, MetadataError> {
    let Some((yaml, _body)) = split_frontmatter(content) else {
        return Ok(None);
    };
    if yaml.trim().is_empty() {
        return Ok(Some(StoredMetadata::default()));
    }

    let header: Value = serde_yaml::from_str(yaml).map_err(MetadataError::Malformed)?;
    let Value::Mapping(_) = header else {
        return Ok(Some(StoredMetadata::default()));
    };

    let updated = header
        .get("timestamps")
        .and_then(|timestamps| timestamps.get("updated"))
        .and_then(Value::as_f64)
        .and_then(timestamp_from_secs);

    Ok(Some(StoredMetadata {
        remote_id: header.get("google_keep_id").and_then(scalar_to_string),
        title: header.get("title").and_then(scalar_to_string),
        updated,
    }))
}

/// Parse raw file bytes, rejecting non-UTF-8 content
pub fn parse_metadata_bytes(bytes: &[u8]) -> Result<Option<StoredMetadata>, MetadataError> {
    let content = String::from_utf8(bytes.to_vec())?;
    parse_metadata(&content)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Convert float epoch seconds to a timestamp at microsecond precision
pub fn timestamp_from_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp_micros((secs * 1_000_000.0).round() as i64)
}

pub fn timestamp_to_secs(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

/// Whether a recorded `updated` value matches the remote one.
///
/// Headers store microsecond precision, so that is the precision compared.
pub fn timestamps_match(recorded: DateTime<Utc>, remote: DateTime<Utc>) -> bool {
    recorded.timestamp_micros() == remote.timestamp_micros()
}

#[derive(Debug, Serialize)]
struct NoteHeader<'a> {
    google_keep_id: &'a str,
    title: &'a str,
    pinned: bool,
    trashed: bool,
    archived: bool,
    color: &'a str,
    #[serde(rename = "type")]
    note_type: &'a str,
    parent_id: Option<&'a str>,
    sort: Option<i64>,
    url: Option<&'a str>,
    tags: &'a [String],
    timestamps: HeaderTimestamps,
}

#[derive(Debug, Serialize)]
struct HeaderTimestamps {
    created: f64,
    edited: f64,
    updated: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    trashed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted: Option<f64>,
}

// The remote service reports "never" as the epoch rather than leaving it out.
fn meaningful(at: Option<DateTime<Utc>>) -> Option<f64> {
    at.filter(|at| at.year() > 1970).map(timestamp_to_secs)
}

/// Render the YAML header for a note, without delimiters
pub fn render_header(note: &RemoteNote) -> Result<String, MetadataError> {
    let header = NoteHeader {
        google_keep_id: &note.id,
        title: &note.title,
        pinned: note.pinned,
        trashed: note.trashed,
        archived: note.archived,
        color: &note.color,
        note_type: &note.note_type,
        parent_id: note.parent_id.as_deref(),
        sort: note.sort,
        url: note.url.as_deref(),
        tags: &note.labels,
        timestamps: HeaderTimestamps {
            created: timestamp_to_secs(note.timestamps.created),
            edited: timestamp_to_secs(note.timestamps.edited),
            updated: timestamp_to_secs(note.timestamps.updated),
            trashed: meaningful(note.timestamps.trashed),
            deleted: meaningful(note.timestamps.deleted),
        },
    };

    serde_yaml::to_string(&header).map_err(MetadataError::Serialize)
}

/// Prefix a rendered body with the note's metadata header
pub fn compose_document(note: &RemoteNote, body: &str) -> Result<String, MetadataError> {
    let yaml = render_header(note)?;
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n\n{body}"))
}
