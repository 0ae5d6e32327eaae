//! Greedy folding of cues into bounded text chunks.
//!
//! A chunk grows cue by cue and is flushed right after the cue that pushes it
//! past either budget, so a chunk may overshoot by at most one cue. Cues are
//! never split.

use crate::types::{Chunk, Cue};

pub const DEFAULT_MAX_CHARS: usize = 180;
pub const DEFAULT_MAX_SECS: f64 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkConfig {
    /// Flush once the buffered text is longer than this many characters.
    pub max_chars: usize,
    /// Flush once the buffer spans more than this many seconds.
    pub max_secs: f64,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            max_secs: DEFAULT_MAX_SECS,
        }
    }
}

/// Collapse every whitespace run to a single space and trim.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct ChunkBuffer {
    texts: Vec<String>,
    chars: usize,
    start: Option<f64>,
    last_end: f64,
}

impl ChunkBuffer {
    fn new() -> Self {
        Self {
            texts: Vec::new(),
            chars: 0,
            start: None,
            last_end: 0.0,
        }
    }

    fn push(&mut self, cue: &Cue, text: String) {
        self.start.get_or_insert(cue.start);
        self.chars += text.chars().count();
        self.texts.push(text);
        self.last_end = cue.end();
    }

    fn exceeds(&self, config: &ChunkConfig) -> bool {
        let Some(start) = self.start else {
            return false;
        };
        self.chars > config.max_chars || (self.last_end - start) > config.max_secs
    }

    fn flush(&mut self) -> Option<Chunk> {
        let start = self.start.take()?;
        let text = self.texts.join(" ");
        self.texts.clear();
        self.chars = 0;
        Some(Chunk {
            t: start.floor() as u64,
            text,
        })
    }
}

/// Fold an ordered cue sequence into chunks. Empty cues are dropped before
/// they can touch the buffer; a trailing under-budget buffer becomes the last
/// chunk.
pub fn segment_cues(cues: &[Cue], config: ChunkConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut buffer = ChunkBuffer::new();

    for cue in cues {
        let text = normalize_text(&cue.text);
        if text.is_empty() {
            continue;
        }

        buffer.push(cue, text);

        if buffer.exceeds(&config) {
            chunks.extend(buffer.flush());
        }
    }

    chunks.extend(buffer.flush());
    chunks
}
