//! Batch driver: resolve, chunk and record every video of a list.

use std::{path::Path, sync::Arc};

use tokio::{fs, sync::Semaphore};
use tracing::{debug, error};

use crate::{
    error::Result,
    segment::{ChunkConfig, segment_cues},
    source::{CueOrigin, CueResolver},
    types::{VideoMeta, VideoRecord},
};

pub const DEFAULT_RECORD_LANG: &str = "ar";
pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub chunk: ChunkConfig,
    /// Value written to every record's `lang` field.
    pub lang: String,
    /// Videos processed at the same time.
    pub concurrency: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk: ChunkConfig::default(),
            lang: DEFAULT_RECORD_LANG.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Outcome for one video, handed to the progress callback.
#[derive(Debug, Clone)]
pub struct VideoOutcome<'a> {
    pub record: &'a VideoRecord,
    pub origin: &'a CueOrigin,
    pub cue_count: usize,
}

/// Resolve and chunk a single video.
pub async fn index_video(
    meta: VideoMeta,
    resolver: &CueResolver,
    config: &IndexConfig,
) -> (VideoRecord, CueOrigin, usize) {
    let resolved = resolver.resolve(&meta.id).await;
    let chunks = segment_cues(&resolved.cues, config.chunk);
    debug!(
        "{}: {} cues -> {} chunks ({})",
        meta.id,
        resolved.cues.len(),
        chunks.len(),
        resolved.origin
    );
    let record = VideoRecord::new(meta, &config.lang, chunks);
    (record, resolved.origin, resolved.cues.len())
}

/// Index every video. Work runs concurrently up to `config.concurrency`, but
/// records come back in input order. A video whose task dies still gets a
/// record, with no terms.
pub async fn build_index<F>(
    videos: Vec<VideoMeta>,
    resolver: Arc<CueResolver>,
    config: &IndexConfig,
    mut on_done: F,
) -> Vec<VideoRecord>
where
    F: FnMut(VideoOutcome<'_>),
{
    let permits = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let mut handles = Vec::with_capacity(videos.len());

    for meta in videos {
        let permits = Arc::clone(&permits);
        let resolver = Arc::clone(&resolver);
        let task_config = config.clone();
        let fallback = meta.clone();

        let handle = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await;
            index_video(meta, &resolver, &task_config).await
        });
        handles.push((fallback, handle));
    }

    let mut records = Vec::with_capacity(handles.len());
    for (fallback, handle) in handles {
        let (record, origin, cue_count) = match handle.await {
            Ok(result) => result,
            Err(e) => {
                error!("{}: indexing task failed: {}", fallback.id, e);
                (
                    VideoRecord::new(fallback, &config.lang, Vec::new()),
                    CueOrigin::Unavailable,
                    0,
                )
            }
        };

        on_done(VideoOutcome {
            record: &record,
            origin: &origin,
            cue_count,
        });
        records.push(record);
    }

    records
}

/// Load a manual video list: a JSON array of `{id, title?, date?, url?}`.
pub async fn load_video_list(path: &Path) -> Result<Vec<VideoMeta>> {
    let json_content = fs::read_to_string(path).await?;
    let videos: Vec<VideoMeta> = serde_json::from_str(&json_content)?;
    Ok(videos.into_iter().map(VideoMeta::with_default_url).collect())
}

/// Save the index as pretty JSON, creating parent directories
pub async fn save_index(records: &[VideoRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let pretty_json = serde_json::to_string_pretty(records)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}
