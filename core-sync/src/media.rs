//! # Media Materializer
//!
//! Default [`ContentMaterializer`]: owns the on-disk media layout and delegates
//! the byte transfer to a [`MediaFetcher`].
//!
//! Media for a note lands in `<media dir>/<note id>/<media id><ext>`. When
//! `skip_existing` is set, a file that is already present with the size the
//! remote service reports is left alone.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::{
    BridgeError, ContentMaterializer, FileSystemAccess, MaterializedMedia, MediaFetcher,
    RemoteMedia, RemoteNote,
};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::naming::media_file_name;

pub struct MediaDownloader {
    fs: Arc<dyn FileSystemAccess>,
    fetcher: Arc<dyn MediaFetcher>,
    media_dir: PathBuf,
    skip_existing: bool,
}

impl MediaDownloader {
    pub fn new(
        fs: Arc<dyn FileSystemAccess>,
        fetcher: Arc<dyn MediaFetcher>,
        media_dir: impl Into<PathBuf>,
        skip_existing: bool,
    ) -> Self {
        Self {
            fs,
            fetcher,
            media_dir: media_dir.into(),
            skip_existing,
        }
    }

    /// Directory holding the media of `note_id`.
    ///
    /// The id becomes a single path component, so ids that would resolve
    /// outside the media directory are rejected.
    pub fn note_dir(&self, note_id: &str) -> Result<PathBuf> {
        let mut components = Path::new(note_id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) if !note_id.contains('\\') => {
                Ok(self.media_dir.join(note_id))
            }
            _ => Err(BridgeError::OperationFailed(format!(
                "Note id {:?} cannot be used as a media directory name",
                note_id
            ))),
        }
    }

    /// Where `media` of `note_id` is stored
    pub fn media_path(&self, note_id: &str, media: &RemoteMedia) -> Result<PathBuf> {
        Ok(self.note_dir(note_id)?.join(media_file_name(media)))
    }

    async fn is_current(&self, path: &Path, media: &RemoteMedia) -> Result<bool> {
        if !self.skip_existing {
            return Ok(false);
        }
        let Some(expected) = media.byte_size else {
            return Ok(false);
        };
        if !self.fs.exists(path).await? {
            return Ok(false);
        }

        Ok(self.fs.metadata(path).await?.size == expected)
    }
}

#[async_trait]
impl ContentMaterializer for MediaDownloader {
    #[instrument(skip(self, note), fields(note_id = %note.id, media = note.media.len()))]
    async fn materialize_content(&self, note: &RemoteNote) -> Result<MaterializedMedia> {
        let mut materialized = MaterializedMedia::default();
        if note.media.is_empty() {
            return Ok(materialized);
        }

        let note_dir = self.note_dir(&note.id)?;
        self.fs.create_dir_all(&note_dir).await?;

        for media in &note.media {
            let path = note_dir.join(media_file_name(media));

            if self.is_current(&path, media).await? {
                debug!(media_id = %media.id, path = ?path, "Media unchanged, skipping transfer");
            } else {
                debug!(media_id = %media.id, kind = media.kind.label(), "Fetching media");
                let data = self.fetcher.fetch_media(&note.id, media).await?;
                self.fs.write_file(&path, data).await?;
                materialized.downloaded += 1;
            }

            materialized.paths.push(path);
        }

        Ok(materialized)
    }
}
