//! YouTube-backed collaborators: video listing through the Data API and
//! caption tracks through `yt-dlp`.

mod captions;
mod data_api;

pub use captions::YtDlpTranscripts;
pub use data_api::DataApiClient;

use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

fn http_client(timeout: Duration) -> crate::error::Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}
