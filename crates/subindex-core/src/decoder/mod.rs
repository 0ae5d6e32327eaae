//! Cue decoding.
//!
//! Turns WebVTT documents, SubRip documents and records from a remote
//! transcript API into one ordered `Vec<Cue>`. Decoding never fails: a block
//! that cannot be read is skipped and the rest of the document still counts.

mod srt;
mod vtt;

use serde::{Deserialize, Serialize};

use crate::types::Cue;

pub use srt::decode_srt;
pub use vtt::decode_vtt;

const RANGE_SEPARATOR: &str = "-->";

/// The two local subtitle encodings, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Vtt,
    Srt,
}

impl SubtitleFormat {
    pub const LOOKUP_ORDER: [SubtitleFormat; 2] = [SubtitleFormat::Vtt, SubtitleFormat::Srt];

    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::Vtt => "vtt",
            SubtitleFormat::Srt => "srt",
        }
    }

    pub fn decode(&self, content: &str) -> Vec<Cue> {
        match self {
            SubtitleFormat::Vtt => decode_vtt(content),
            SubtitleFormat::Srt => decode_srt(content),
        }
    }
}

/// A caption record as a transcript API hands it out. Every field may be
/// missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteCue {
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Default missing numbers to 0.0 and missing text to "". Order is kept.
pub fn normalize_remote(records: Vec<RemoteCue>) -> Vec<Cue> {
    records
        .into_iter()
        .map(|r| Cue {
            start: finite_or_zero(r.start),
            duration: finite_or_zero(r.duration).max(0.0),
            text: r.text.unwrap_or_default(),
        })
        .collect()
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Split a document into blocks of consecutive non-blank lines. Lines are
/// trimmed; a BOM and any line-ending convention are accepted.
fn split_blocks(input: &str) -> Vec<Vec<String>> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let normalized = input.replace("\r\n", "\n").replace('\r', "\n");

    let mut blocks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for line in normalized.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.to_string());
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// Whole seconds from clock components. Only `seconds` may carry a
/// fractional part, and it is truncated away.
fn clock_to_seconds(hours: &str, minutes: &str, seconds: &str) -> Option<u64> {
    let hours: u64 = hours.parse().ok()?;
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: f64 = seconds.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let whole = hours.checked_mul(3600)?.checked_add(minutes.checked_mul(60)?)?;
    whole.checked_add(seconds.trunc() as u64)
}

fn cue_from_range(start: u64, end: u64, text: String) -> Cue {
    Cue {
        start: start as f64,
        duration: end.saturating_sub(start) as f64,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_blocks_handles_crlf_bom_and_blank_runs() {
        let doc = "\u{feff}WEBVTT\r\n\r\n\r\n00:01.000 --> 00:02.000\r\nhi\r\n  \r\nlast";
        let blocks = split_blocks(doc);
        assert_eq!(
            blocks,
            vec![
                vec!["WEBVTT".to_string()],
                vec!["00:01.000 --> 00:02.000".to_string(), "hi".to_string()],
                vec!["last".to_string()],
            ]
        );
    }

    #[test]
    fn test_clock_truncates_fractional_seconds() {
        assert_eq!(clock_to_seconds("1", "02", "03.999"), Some(3723));
        assert_eq!(clock_to_seconds("0", "00", "abc"), None);
        assert_eq!(clock_to_seconds("x", "00", "01"), None);
        assert_eq!(clock_to_seconds("9999999999999999", "00", "00"), None);
        assert_eq!(clock_to_seconds("0", "18446744073709551615", "00"), None);
    }

    #[test]
    fn test_normalize_remote_defaults_missing_fields() {
        let cues = normalize_remote(vec![
            RemoteCue {
                start: Some(1.5),
                duration: Some(2.25),
                text: Some("hello".to_string()),
            },
            RemoteCue::default(),
            RemoteCue {
                start: Some(f64::NAN),
                duration: Some(-3.0),
                text: None,
            },
        ]);

        assert_eq!(cues[0], Cue::new(1.5, 2.25, "hello"));
        assert_eq!(cues[1], Cue::new(0.0, 0.0, ""));
        assert_eq!(cues[2], Cue::new(0.0, 0.0, ""));
    }

    #[test]
    fn test_remote_cue_deserializes_partial_records() {
        let records: Vec<RemoteCue> =
            serde_json::from_str(r#"[{"start": 3.0, "text": "x"}, {}]"#).unwrap();
        let cues = normalize_remote(records);
        assert_eq!(cues, vec![Cue::new(3.0, 0.0, "x"), Cue::new(0.0, 0.0, "")]);
    }

    #[test]
    fn test_format_dispatch() {
        assert_eq!(SubtitleFormat::Vtt.extension(), "vtt");
        assert_eq!(SubtitleFormat::Srt.extension(), "srt");
        let cues = SubtitleFormat::Srt.decode("1\n00:00:01,000 --> 00:00:02,000\nok");
        assert_eq!(cues, vec![Cue::new(1.0, 1.0, "ok")]);
    }
}
