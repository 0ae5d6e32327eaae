//! Where a video's cues come from.
//!
//! Local subtitle files win over the remote transcript source, VTT before
//! SRT, and the first document found is used as-is. Remote failures of any
//! kind resolve to zero cues.

use std::{fmt, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    cache::file_stem,
    decoder::{RemoteCue, SubtitleFormat, normalize_remote},
    error::{Result, SubindexError},
    types::Cue,
};

pub const DEFAULT_LANGUAGES: [&str; 2] = ["ar", "en"];

/// Raw subtitle documents keyed by video id. A missing document is `None`,
/// not an error.
#[async_trait]
pub trait SubtitleStore: Send + Sync {
    async fn load(&self, video_id: &str, format: SubtitleFormat) -> Option<String>;
}

/// `{dir}/{id}.vtt` and `{dir}/{id}.srt`. Ids are sanitized to a plain file
/// stem so they never leave `dir`.
#[derive(Debug, Clone)]
pub struct DirSubtitleStore {
    dir: PathBuf,
}

impl DirSubtitleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, video_id: &str, format: SubtitleFormat) -> PathBuf {
        self.dir
            .join(format!("{}.{}", file_stem(video_id), format.extension()))
    }
}

#[async_trait]
impl SubtitleStore for DirSubtitleStore {
    async fn load(&self, video_id: &str, format: SubtitleFormat) -> Option<String> {
        let path = self.path_for(video_id, format);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Ignoring unreadable subtitle file {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Manual,
    Generated,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Manual => write!(f, "manual"),
            TrackKind::Generated => write!(f, "generated"),
        }
    }
}

/// One transcript track a remote source offers for a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptTrack {
    pub language_code: String,
    pub kind: TrackKind,
    /// Source-specific locator (e.g. a download URL). Empty when the track has
    /// no rendition the source can fetch; such tracks are never selected.
    #[serde(default)]
    pub locator: String,
}

impl TranscriptTrack {
    pub fn new(
        language_code: impl Into<String>,
        kind: TrackKind,
        locator: impl Into<String>,
    ) -> Self {
        Self {
            language_code: language_code.into(),
            kind,
            locator: locator.into(),
        }
    }

    pub fn is_fetchable(&self) -> bool {
        !self.locator.is_empty()
    }
}

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// All tracks available for the video. Fails with
    /// [`SubindexError::TranscriptsDisabled`] when the video has none.
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<TranscriptTrack>>;

    async fn fetch_track(&self, video_id: &str, track: &TranscriptTrack)
    -> Result<Vec<RemoteCue>>;
}

/// Manual tracks in preference order, then generated tracks in preference
/// order, then whatever comes first. Tracks without a locator are skipped.
pub fn select_track<'a, S: AsRef<str>>(
    tracks: &'a [TranscriptTrack],
    languages: &[S],
) -> Option<&'a TranscriptTrack> {
    [TrackKind::Manual, TrackKind::Generated]
        .iter()
        .find_map(|kind| {
            languages.iter().find_map(|lang| {
                tracks.iter().find(|t| {
                    t.is_fetchable() && t.kind == *kind && t.language_code == lang.as_ref()
                })
            })
        })
        .or_else(|| tracks.iter().find(|t| t.is_fetchable()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueOrigin {
    Local(SubtitleFormat),
    Remote {
        language_code: String,
        kind: TrackKind,
    },
    Unavailable,
}

impl fmt::Display for CueOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CueOrigin::Local(format) => write!(f, "local {}", format.extension()),
            CueOrigin::Remote {
                language_code,
                kind,
            } => write!(f, "remote {} ({})", language_code, kind),
            CueOrigin::Unavailable => write!(f, "unavailable"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedCues {
    pub origin: CueOrigin,
    pub cues: Vec<Cue>,
}

impl ResolvedCues {
    fn unavailable() -> Self {
        Self {
            origin: CueOrigin::Unavailable,
            cues: Vec::new(),
        }
    }
}

/// Picks the cue source for each video. Holds no per-video state, so one
/// resolver is shared by every worker.
pub struct CueResolver {
    store: Option<Box<dyn SubtitleStore>>,
    remote: Arc<dyn TranscriptSource>,
    languages: Vec<String>,
}

impl CueResolver {
    pub fn new(remote: Arc<dyn TranscriptSource>) -> Self {
        Self {
            store: None,
            remote,
            languages: DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn with_store(mut self, store: impl SubtitleStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub async fn resolve(&self, video_id: &str) -> ResolvedCues {
        if let Some(store) = &self.store {
            for format in SubtitleFormat::LOOKUP_ORDER {
                if let Some(content) = store.load(video_id, format).await {
                    let cues = format.decode(&content);
                    debug!(
                        "{}: decoded {} cues from local {}",
                        video_id,
                        cues.len(),
                        format.extension()
                    );
                    return ResolvedCues {
                        origin: CueOrigin::Local(format),
                        cues,
                    };
                }
            }
        }

        match self.resolve_remote(video_id).await {
            Ok(resolved) => resolved,
            Err(e) => {
                if e.is_soft() {
                    info!("{}: no cues ({})", video_id, e);
                } else {
                    warn!("{}: transcript lookup failed: {}", video_id, e);
                }
                ResolvedCues::unavailable()
            }
        }
    }

    async fn resolve_remote(&self, video_id: &str) -> Result<ResolvedCues> {
        let tracks = self.remote.list_tracks(video_id).await?;
        let track = select_track(&tracks, self.languages.as_slice()).ok_or_else(|| {
            SubindexError::NoTranscriptFound {
                video_id: video_id.to_string(),
            }
        })?;

        let records = self.remote.fetch_track(video_id, track).await?;
        let cues = normalize_remote(records);
        debug!(
            "{}: fetched {} cues from {} {} track",
            video_id,
            cues.len(),
            track.kind,
            track.language_code
        );

        Ok(ResolvedCues {
            origin: CueOrigin::Remote {
                language_code: track.language_code.clone(),
                kind: track.kind,
            },
            cues,
        })
    }
}
