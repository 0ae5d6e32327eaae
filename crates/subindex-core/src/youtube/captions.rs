use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use super::{DEFAULT_TIMEOUT, http_client};
use crate::{
    decoder::RemoteCue,
    error::{Result, SubindexError},
    source::{TrackKind, TranscriptSource, TranscriptTrack},
    types::watch_url,
};

/// Caption tracks discovered with `yt-dlp` and downloaded in YouTube's
/// `json3` timed-text rendition.
pub struct YtDlpTranscripts {
    client: reqwest::Client,
    binary: String,
    timeout: Duration,
}

impl YtDlpTranscripts {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            binary: "yt-dlp".to_string(),
            timeout,
        })
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    async fn dump_info(&self, video_id: &str) -> Result<VideoInfo> {
        let url = watch_url(video_id);
        let output = Command::new(&self.binary)
            .arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg("--extractor-args")
            .arg("youtube:player_client=android,web")
            .arg(&url)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| SubindexError::Timeout {
                what: format!("yt-dlp for {}", video_id),
                secs: self.timeout.as_secs(),
            })??;

        if !output.status.success() {
            return Err(SubindexError::TranscriptFetchFailed {
                video_id: video_id.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

impl Default for YtDlpTranscripts {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            binary: "yt-dlp".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VideoInfo {
    #[serde(default)]
    subtitles: Option<BTreeMap<String, Vec<CaptionFormat>>>,
    #[serde(default)]
    automatic_captions: Option<BTreeMap<String, Vec<CaptionFormat>>>,
}

#[derive(Debug, Deserialize)]
struct CaptionFormat {
    #[serde(default)]
    ext: String,
    #[serde(default)]
    url: String,
}

/// Machine translations of another track carry a `tlang` query parameter.
fn is_translation(url: &str) -> bool {
    reqwest::Url::parse(url)
        .map(|u| u.query_pairs().any(|(key, _)| key == "tlang"))
        .unwrap_or(false)
}

/// Manual tracks first, then generated ones, each group ordered by language
/// code. Live chat replays and machine translations are not captions of the
/// spoken audio.
fn tracks_from_info(info: VideoInfo) -> Vec<TranscriptTrack> {
    let groups = [
        (TrackKind::Manual, info.subtitles),
        (TrackKind::Generated, info.automatic_captions),
    ];

    groups
        .into_iter()
        .flat_map(|(kind, map)| {
            map.unwrap_or_default()
                .into_iter()
                .filter(|(lang, _)| lang != "live_chat")
                .filter_map(move |(language_code, formats)| {
                    let listed = formats.len();
                    let originals: Vec<CaptionFormat> = formats
                        .into_iter()
                        .filter(|f| !is_translation(&f.url))
                        .collect();
                    if listed > 0 && originals.is_empty() {
                        debug!("Skipping translated {} track {}", kind, language_code);
                        return None;
                    }
                    let locator = originals
                        .into_iter()
                        .find(|f| f.ext == "json3")
                        .map(|f| f.url)
                        .unwrap_or_default();
                    Some(TranscriptTrack::new(language_code, kind, locator))
                })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    t_start_ms: Option<f64>,
    d_duration_ms: Option<f64>,
    segs: Option<Vec<Json3Segment>>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Window and style events carry no `segs` and are dropped.
fn parse_json3(body: &str) -> Result<Vec<RemoteCue>> {
    let doc: Json3 = serde_json::from_str(body)?;
    Ok(doc
        .events
        .into_iter()
        .filter_map(|event| {
            let segs = event.segs?;
            Some(RemoteCue {
                start: event.t_start_ms.map(|ms| ms / 1000.0),
                duration: event.d_duration_ms.map(|ms| ms / 1000.0),
                text: Some(segs.into_iter().map(|s| s.utf8).collect()),
            })
        })
        .collect())
}

#[async_trait]
impl TranscriptSource for YtDlpTranscripts {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<TranscriptTrack>> {
        let tracks = tracks_from_info(self.dump_info(video_id).await?);
        if tracks.is_empty() {
            return Err(SubindexError::TranscriptsDisabled {
                video_id: video_id.to_string(),
            });
        }
        debug!("{}: {} caption tracks", video_id, tracks.len());
        Ok(tracks)
    }

    async fn fetch_track(
        &self,
        video_id: &str,
        track: &TranscriptTrack,
    ) -> Result<Vec<RemoteCue>> {
        if track.locator.is_empty() {
            return Err(SubindexError::NoTranscriptFound {
                video_id: video_id.to_string(),
            });
        }

        let body = self
            .client
            .get(&track.locator)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_json3(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::select_track;

    #[test]
    fn test_tracks_manual_before_generated() {
        let info: VideoInfo = serde_json::from_str(
            r#"{
                "subtitles": {
                    "en": [{"ext": "vtt", "url": "https://x/en.vtt"}, {"ext": "json3", "url": "https://x/en.json3"}],
                    "live_chat": [{"ext": "json", "url": "https://x/chat"}]
                },
                "automatic_captions": {
                    "ar": [{"ext": "json3", "url": "https://x/ar.json3"}],
                    "de": [{"ext": "srv3", "url": "https://x/de.srv3"}]
                }
            }"#,
        )
        .unwrap();

        let tracks = tracks_from_info(info);
        assert_eq!(
            tracks,
            vec![
                TranscriptTrack {
                    language_code: "en".to_string(),
                    kind: TrackKind::Manual,
                    locator: "https://x/en.json3".to_string(),
                },
                TranscriptTrack {
                    language_code: "ar".to_string(),
                    kind: TrackKind::Generated,
                    locator: "https://x/ar.json3".to_string(),
                },
                TranscriptTrack {
                    language_code: "de".to_string(),
                    kind: TrackKind::Generated,
                    locator: String::new(),
                },
            ]
        );
    }

    #[test]
    fn test_translated_generated_tracks_are_dropped() {
        let info: VideoInfo = serde_json::from_str(
            r#"{
                "automatic_captions": {
                    "ar": [{"ext": "json3", "url": "https://x/timedtext?v=vid&lang=en&kind=asr&tlang=ar&fmt=json3"}],
                    "en": [{"ext": "json3", "url": "https://x/timedtext?v=vid&lang=en&kind=asr&fmt=json3"}]
                }
            }"#,
        )
        .unwrap();

        let tracks = tracks_from_info(info);
        assert_eq!(
            tracks,
            vec![TranscriptTrack::new(
                "en",
                TrackKind::Generated,
                "https://x/timedtext?v=vid&lang=en&kind=asr&fmt=json3"
            )]
        );

        let chosen = select_track(&tracks, &["ar", "en"]).unwrap();
        assert_eq!(chosen.language_code, "en");
    }

    #[test]
    fn test_null_caption_maps_give_no_tracks() {
        let info: VideoInfo =
            serde_json::from_str(r#"{"subtitles": null, "title": "x"}"#).unwrap();
        assert!(tracks_from_info(info).is_empty());
    }

    #[test]
    fn test_json3_events_to_remote_cues() {
        let body = r#"{
            "wireMagic": "pb3",
            "events": [
                {"tStartMs": 0, "dDurationMs": 500000, "id": 1, "wpWinPosId": 1},
                {"tStartMs": 1200, "dDurationMs": 2300, "segs": [{"utf8": "hello"}, {"utf8": " world", "tOffsetMs": 400}]},
                {"tStartMs": 3500, "segs": [{"utf8": "\n"}]}
            ]
        }"#;

        let cues = parse_json3(body).unwrap();
        assert_eq!(
            cues,
            vec![
                RemoteCue {
                    start: Some(1.2),
                    duration: Some(2.3),
                    text: Some("hello world".to_string()),
                },
                RemoteCue {
                    start: Some(3.5),
                    duration: None,
                    text: Some("\n".to_string()),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_track_without_json3_is_not_found() {
        let source = YtDlpTranscripts::default();
        let track = TranscriptTrack::new("de", TrackKind::Generated, "");
        let err = source.fetch_track("vid", &track).await.unwrap_err();
        assert!(matches!(err, SubindexError::NoTranscriptFound { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_soft_error() {
        let source = YtDlpTranscripts::default().with_binary("/nonexistent/yt-dlp-binary");
        let err = source.list_tracks("vid").await.unwrap_err();
        assert!(err.is_soft());
    }
}
