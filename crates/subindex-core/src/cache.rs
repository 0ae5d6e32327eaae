use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;
use tracing::{debug, warn};

use crate::{
    decoder::RemoteCue,
    error::Result,
    source::{TranscriptSource, TranscriptTrack},
};

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("subindex")
}

/// Get the directory holding cached transcript responses
pub fn get_transcript_cache_dir(root: &Path) -> PathBuf {
    root.join("transcripts")
}

/// Get the path for one cached track (language and kind aware)
pub fn get_track_path(root: &Path, video_id: &str, track: &TranscriptTrack) -> PathBuf {
    get_transcript_cache_dir(root).join(format!(
        "{}.{}.{}.json",
        file_stem(video_id),
        file_stem(&track.language_code),
        track.kind
    ))
}

/// Keep `[A-Za-z0-9_-]`, replace everything else with `_`.
pub(crate) fn file_stem(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Replays earlier track downloads from disk. Track lists are always fetched
/// live because their locators expire. Cache trouble is logged and otherwise
/// ignored; errors from the wrapped source are never cached.
pub struct CachedTranscriptSource<S> {
    inner: S,
    root: PathBuf,
}

impl<S: TranscriptSource> CachedTranscriptSource<S> {
    pub fn new(inner: S, root: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            root: root.into(),
        }
    }
}

async fn read_cached<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = fs::read_to_string(path).await.ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => {
            debug!("Cache hit: {}", path.display());
            Some(value)
        }
        Err(e) => {
            warn!("Ignoring corrupt cache file {}: {}", path.display(), e);
            None
        }
    }
}

async fn write_cached<T: Serialize + Sync>(path: &Path, value: &T) {
    if let Err(e) = try_write_cached(path, value).await {
        warn!("Failed to write cache file {}: {}", path.display(), e);
    }
}

async fn try_write_cached<T: Serialize + Sync>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, serde_json::to_string(value)?).await?;
    Ok(())
}

#[async_trait]
impl<S: TranscriptSource> TranscriptSource for CachedTranscriptSource<S> {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<TranscriptTrack>> {
        self.inner.list_tracks(video_id).await
    }

    async fn fetch_track(
        &self,
        video_id: &str,
        track: &TranscriptTrack,
    ) -> Result<Vec<RemoteCue>> {
        let path = get_track_path(&self.root, video_id, track);
        if let Some(cues) = read_cached(&path).await {
            return Ok(cues);
        }

        let cues = self.inner.fetch_track(video_id, track).await?;
        write_cached(&path, &cues).await;
        Ok(cues)
    }
}
