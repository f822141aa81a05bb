//! Markdown body for a mirrored note.
//!
//! ```text
//! # <title>
//!
//! ## Note
//!
//! <text, checkboxes as task list items>
//!
//! ## Links
//!
//! - [<title>](<url>)
//!
//! ## Attached Media
//!
//! ![](<media file name>)
//! ```
//!
//! The links and media sections only appear when the note has any.
//!
//! Media links carry the bare file name. The files themselves live in
//! `media/<note id>/` below the output root, so the links do not resolve from
//! the note file; this keeps the layout produced by earlier exports.

use bridge_traits::error::Result;
use bridge_traits::{DocumentRenderer, NoteLink, RemoteNote};
use std::path::PathBuf;
use tracing::trace;

const CHECKED: &str = "☑ ";
const UNCHECKED: &str = "☐ ";

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }
}

/// Turn list checkboxes into Markdown task list items
fn convert_checkboxes(text: &str) -> String {
    text.replace(CHECKED, "- [X] ").replace(UNCHECKED, "- [ ] ")
}

fn link_line(link: &NoteLink) -> String {
    format!("- [{}]({})", link.title, link.url)
}

impl DocumentRenderer for MarkdownRenderer {
    fn render_document(&self, note: &RemoteNote, media_paths: &[PathBuf]) -> Result<String> {
        trace!(note_id = %note.id, media = media_paths.len(), "Rendering markdown");

        let mut doc = format!(
            "# {}\n\n## Note\n\n{}\n",
            note.title,
            convert_checkboxes(&note.text)
        );

        if !note.links.is_empty() {
            doc.push_str("\n## Links\n\n");
            for link in &note.links {
                doc.push_str(&link_line(link));
                doc.push('\n');
            }
        }

        let names: Vec<&str> = media_paths
            .iter()
            .filter_map(|path| path.file_name())
            .filter_map(|name| name.to_str())
            .collect();
        if !names.is_empty() {
            doc.push_str("\n## Attached Media\n\n");
            for name in names {
                doc.push_str(&format!("![]({})\n", name));
            }
        }

        Ok(doc)
    }
}
