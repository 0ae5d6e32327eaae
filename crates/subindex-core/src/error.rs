use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubindexError {
    #[error("Transcripts are disabled for video {video_id}")]
    TranscriptsDisabled { video_id: String },

    #[error("No transcript found for video {video_id}")]
    NoTranscriptFound { video_id: String },

    #[error("Transcript fetch failed for {video_id}: {reason}")]
    TranscriptFetchFailed { video_id: String, reason: String },

    #[error("Video listing failed: {reason}")]
    ListingFailed { reason: String },

    #[error("{what} timed out after {secs}s")]
    Timeout { what: String, secs: u64 },

    #[error("Missing configuration: {env_var} environment variable is not set")]
    MissingEnv { env_var: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

impl SubindexError {
    /// Errors a transcript source may raise for a single video. These degrade
    /// that video to zero cues and never stop the batch.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            SubindexError::TranscriptsDisabled { .. }
                | SubindexError::NoTranscriptFound { .. }
                | SubindexError::TranscriptFetchFailed { .. }
                | SubindexError::Timeout { .. }
                | SubindexError::IoError(_)
                | SubindexError::JsonError(_)
                | SubindexError::ApiError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SubindexError>;
