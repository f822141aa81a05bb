//! Filename derivation for notes and media.

use bridge_traits::{RemoteMedia, RemoteNote};
use chrono::format::{Item, StrftimeItems};
use std::fmt::Write;
use std::path::Path;

use crate::error::{Result, SyncError};

/// Maximum length in bytes of a sanitized filename stem
pub const MAX_STEM_BYTES: usize = 135;

pub const NOTE_EXTENSION: &str = "md";

const UNTITLED: &str = "untitled";

const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Make `raw` safe to use as a single path component on any desktop platform.
///
/// Characters that are invalid in filenames are dropped, the result is cut to
/// `max_bytes` on a char boundary, and trailing dots and spaces are removed.
pub fn sanitize_filename(raw: &str, max_bytes: usize) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| {
            !c.is_control() && !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
        })
        .collect();

    let mut end = cleaned.len().min(max_bytes);
    while !cleaned.is_char_boundary(end) {
        end -= 1;
    }

    let mut name = cleaned[..end]
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string();

    if name.is_empty() {
        return "_".to_string();
    }

    let upper = name.to_ascii_uppercase();
    let base = upper.split('.').next().unwrap_or(&upper);
    if RESERVED_NAMES.contains(&base) {
        name.push('_');
    }

    name
}

/// Canonical filename stem: `"<created date> - <title>"`, sanitized.
///
/// The date is formatted in UTC with the strftime pattern `date_format`.
pub fn canonical_stem(note: &RemoteNote, date_format: &str) -> Result<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(date_format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(SyncError::InvalidDateFormat(date_format.to_string()));
    }

    let mut date = String::new();
    write!(
        date,
        "{}",
        note.timestamps.created.format_with_items(items.iter())
    )
    .map_err(|_| SyncError::InvalidDateFormat(date_format.to_string()))?;

    let title = match note.title.trim() {
        "" => UNTITLED,
        title => title,
    };

    Ok(sanitize_filename(
        &format!("{} - {}", date, title),
        MAX_STEM_BYTES,
    ))
}

/// `<stem>.md`
pub fn note_file_name(stem: &str) -> String {
    format!("{}.{}", stem, NOTE_EXTENSION)
}

/// `<stem>.<remote-id>.<n>.md`, used when the canonical name is taken
pub fn deduplicated_file_name(stem: &str, remote_id: &str, n: u32) -> String {
    format!(
        "{}.{}.{}.{}",
        stem,
        sanitize_filename(remote_id, MAX_STEM_BYTES),
        n,
        NOTE_EXTENSION
    )
}

/// File stem under which a media item is stored
pub fn media_file_stem(media_id: &str) -> String {
    sanitize_filename(media_id, MAX_STEM_BYTES)
}

/// `<sanitized-media-id><ext>`
pub fn media_file_name(media: &RemoteMedia) -> String {
    format!("{}{}", media_file_stem(&media.id), media.kind.extension())
}

/// Recover the media id from a stored media file.
///
/// Only the final extension is removed, so ids containing dots survive.
pub fn media_id_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

pub fn is_note_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case(NOTE_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{MediaKind, NoteTimestamps};
    use chrono::{TimeZone, Utc};

    fn note(title: &str) -> RemoteNote {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();
        RemoteNote::new("abc", title, NoteTimestamps::at(created))
    }

    #[test]
    fn test_canonical_stem() {
        assert_eq!(
            canonical_stem(&note("Todo"), "%Y-%m-%d").unwrap(),
            "2024-01-01 - Todo"
        );
        assert_eq!(
            canonical_stem(&note("  Todo  "), "%Y%m%d").unwrap(),
            "20240101 - Todo"
        );
    }

    #[test]
    fn test_empty_title_is_untitled() {
        assert_eq!(
            canonical_stem(&note("   "), "%Y-%m-%d").unwrap(),
            "2024-01-01 - untitled"
        );
    }

    #[test]
    fn test_date_format_separators_are_sanitized() {
        assert_eq!(
            canonical_stem(&note("Todo"), "%Y/%m/%d %H:%M").unwrap(),
            "20240101 0930 - Todo"
        );
    }

    #[test]
    fn test_invalid_date_format() {
        let err = canonical_stem(&note("Todo"), "%Q").unwrap_err();
        assert!(matches!(err, SyncError::InvalidDateFormat(_)));
    }

    #[test]
    fn test_sanitize_removes_invalid_characters() {
        assert_eq!(sanitize_filename("a/b\\c:d*e?f\"g<h>i|j", 135), "abcdefghij");
        assert_eq!(sanitize_filename("tab\there", 135), "tabhere");
        assert_eq!(sanitize_filename("trailing. . ", 135), "trailing");
        assert_eq!(sanitize_filename("???", 135), "_");
        assert_eq!(sanitize_filename("con", 135), "con_");
    }

    #[test]
    fn test_stem_is_truncated_on_char_boundary() {
        let long_title = "é".repeat(200);
        let stem = canonical_stem(&note(&long_title), "%Y-%m-%d").unwrap();

        assert!(stem.len() <= MAX_STEM_BYTES);
        assert!(stem.starts_with("2024-01-01 - é"));
    }

    #[test]
    fn test_deduplicated_file_name() {
        assert_eq!(
            deduplicated_file_name("2024-01-01 - Todo", "id2", 1),
            "2024-01-01 - Todo.id2.1.md"
        );
    }

    #[test]
    fn test_media_names() {
        let media = RemoteMedia::new("1abc.xyz", MediaKind::Drawing);
        let name = media_file_name(&media);

        assert_eq!(name, "1abc.xyz.png");
        assert_eq!(
            media_id_from_path(Path::new(&name)).as_deref(),
            Some(media_file_stem(&media.id).as_str())
        );
    }

    #[test]
    fn test_is_note_file() {
        assert!(is_note_file(Path::new("/out/2024-01-01 - Todo.md")));
        assert!(is_note_file(Path::new("/out/README.MD")));
        assert!(!is_note_file(Path::new("/out/media/abc/m1.png")));
    }
}
