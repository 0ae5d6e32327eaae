use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use super::http_client;
use crate::{
    error::{Result, SubindexError},
    types::VideoMeta,
};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const PAGE_SIZE: &str = "50";

/// YouTube Data API v3 listing of a channel's uploads or any playlist.
pub struct DataApiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChannelList {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    #[serde(default)]
    snippet: Snippet,
    content_details: ItemContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemContentDetails {
    video_id: String,
    video_published_at: Option<String>,
}

impl From<PlaylistItem> for VideoMeta {
    fn from(item: PlaylistItem) -> Self {
        let published = item
            .content_details
            .video_published_at
            .or(item.snippet.published_at)
            .unwrap_or_default();
        let date: String = published.chars().take(10).collect();
        VideoMeta::new(item.content_details.video_id, item.snippet.title, date)
    }
}

impl DataApiClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            base_url: API_BASE.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolve the playlist that holds every upload of a channel
    pub async fn uploads_playlist_id(&self, channel_id: &str) -> Result<String> {
        let response: ChannelList = self
            .client
            .get(format!("{}/channels", self.base_url))
            .query(&[
                ("part", "contentDetails"),
                ("id", channel_id),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .items
            .into_iter()
            .next()
            .map(|item| item.content_details.related_playlists.uploads)
            .ok_or_else(|| SubindexError::ListingFailed {
                reason: format!("channel {} not found", channel_id),
            })
    }

    /// Page through a playlist until it runs out or `max_videos` are listed
    pub async fn list_playlist(
        &self,
        playlist_id: &str,
        max_videos: usize,
    ) -> Result<Vec<VideoMeta>> {
        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: PlaylistItemPage = {
                let mut query = vec![
                    ("part", "snippet,contentDetails"),
                    ("playlistId", playlist_id),
                    ("maxResults", PAGE_SIZE),
                    ("key", self.api_key.as_str()),
                ];
                if let Some(token) = page_token.as_deref() {
                    query.push(("pageToken", token));
                }

                self.client
                    .get(format!("{}/playlistItems", self.base_url))
                    .query(&query)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?
            };

            videos.extend(page.items.into_iter().map(VideoMeta::from));
            debug!("Listed {} videos from {}", videos.len(), playlist_id);

            page_token = page.next_page_token;
            if page_token.is_none() || videos.len() >= max_videos {
                break;
            }
        }

        videos.truncate(max_videos);
        info!("Listed {} videos from playlist {}", videos.len(), playlist_id);
        Ok(videos)
    }

    pub async fn list_channel_uploads(
        &self,
        channel_id: &str,
        max_videos: usize,
    ) -> Result<Vec<VideoMeta>> {
        let playlist_id = self.uploads_playlist_id(channel_id).await?;
        self.list_playlist(&playlist_id, max_videos).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_page_maps_to_video_meta() {
        let page: PlaylistItemPage = serde_json::from_str(
            r#"{
                "nextPageToken": "CDIQAA",
                "items": [
                    {
                        "snippet": {"title": "Lesson 1", "publishedAt": "2023-01-02T00:00:00Z"},
                        "contentDetails": {"videoId": "aaa", "videoPublishedAt": "2022-12-31T18:30:00Z"}
                    },
                    {
                        "snippet": {"title": "Lesson 2", "publishedAt": "2023-02-03T10:00:00Z"},
                        "contentDetails": {"videoId": "bbb"}
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(page.next_page_token.as_deref(), Some("CDIQAA"));
        let videos: Vec<VideoMeta> = page.items.into_iter().map(VideoMeta::from).collect();
        assert_eq!(
            videos,
            vec![
                VideoMeta::new("aaa", "Lesson 1", "2022-12-31"),
                VideoMeta::new("bbb", "Lesson 2", "2023-02-03"),
            ]
        );
    }

    #[test]
    fn test_channel_uploads_playlist_is_read() {
        let list: ChannelList = serde_json::from_str(
            r#"{"items": [{"contentDetails": {"relatedPlaylists": {"likes": "", "uploads": "UUxyz"}}}]}"#,
        )
        .unwrap();
        assert_eq!(list.items[0].content_details.related_playlists.uploads, "UUxyz");

        let empty: ChannelList =
            serde_json::from_str(r#"{"kind": "youtube#channelListResponse"}"#).unwrap();
        assert!(empty.items.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_api_is_an_error() {
        let client = DataApiClient::new("key", Duration::from_secs(2))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        assert!(client.list_channel_uploads("UC123", 10).await.is_err());
    }
}
