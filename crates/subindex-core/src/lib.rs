//! Subindex Core Library
//!
//! Decodes timed captions (WebVTT, SubRip or a remote transcript API) and
//! re-chunks them into bounded, time-anchored text windows for a search index.

pub mod cache;
pub mod decoder;
pub mod error;
pub mod format;
pub mod index;
pub mod segment;
pub mod source;
pub mod types;
pub mod youtube;

// Re-export commonly used items at crate root
pub use cache::{CachedTranscriptSource, get_root_cache_dir};
pub use decoder::{RemoteCue, SubtitleFormat, decode_srt, decode_vtt, normalize_remote};
pub use error::{Result, SubindexError};
pub use format::{format_chunks_with_timestamps, format_timestamp};
pub use index::{IndexConfig, VideoOutcome, build_index, index_video, load_video_list, save_index};
pub use segment::{ChunkConfig, normalize_text, segment_cues};
pub use source::{
    CueOrigin, CueResolver, DirSubtitleStore, ResolvedCues, SubtitleStore, TrackKind,
    TranscriptSource, TranscriptTrack, select_track,
};
pub use types::{Chunk, Cue, TermEntry, VideoMeta, VideoRecord};
pub use youtube::{DataApiClient, YtDlpTranscripts};
