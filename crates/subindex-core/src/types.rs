use serde::{Deserialize, Serialize};

/// One caption unit, in seconds from the start of the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

impl Cue {
    pub fn new(start: f64, duration: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            duration,
            text: text.into(),
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A merged text window anchored at the start of its first cue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub t: u64,
    pub text: String,
}

/// Listing metadata carried through to the output untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMeta {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub url: String,
}

impl VideoMeta {
    pub fn new(id: impl Into<String>, title: impl Into<String>, date: impl Into<String>) -> Self {
        let id = id.into();
        let url = watch_url(&id);
        Self {
            id,
            title: title.into(),
            date: date.into(),
            url,
        }
    }

    /// Fill in the watch URL when a manual list leaves it out.
    pub fn with_default_url(mut self) -> Self {
        if self.url.is_empty() {
            self.url = watch_url(&self.id);
        }
        self
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermEntry {
    pub term: String,
    pub t: u64,
    pub text: String,
    pub tags: Vec<String>,
}

impl From<Chunk> for TermEntry {
    fn from(chunk: Chunk) -> Self {
        Self {
            term: String::new(),
            t: chunk.t,
            text: chunk.text,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub series: String,
    pub date: String,
    pub url: String,
    pub lang: String,
    pub topics: Vec<String>,
    pub terms: Vec<TermEntry>,
}

impl VideoRecord {
    pub fn new(meta: VideoMeta, lang: &str, chunks: Vec<Chunk>) -> Self {
        Self {
            id: meta.id,
            title: meta.title,
            series: String::new(),
            date: meta.date,
            url: meta.url,
            lang: lang.to_string(),
            topics: Vec::new(),
            terms: chunks.into_iter().map(TermEntry::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_in_index_field_order() {
        let meta = VideoMeta::new("abc123", "Episode 1", "2024-03-01");
        let record = VideoRecord::new(
            meta,
            "ar",
            vec![Chunk {
                t: 12,
                text: "hello there".to_string(),
            }],
        );

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"id":"abc123","title":"Episode 1","series":"","date":"2024-03-01","url":"https://www.youtube.com/watch?v=abc123","lang":"ar","topics":[],"terms":[{"term":"","t":12,"text":"hello there","tags":[]}]}"#
        );
    }

    #[test]
    fn test_manual_entry_gets_default_url() {
        let meta: VideoMeta = serde_json::from_str(r#"{"id":"xyz"}"#).unwrap();
        let meta = meta.with_default_url();
        assert_eq!(meta.url, "https://www.youtube.com/watch?v=xyz");
        assert!(meta.title.is_empty());
    }
}
