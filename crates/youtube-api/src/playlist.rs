//! Playlist aggregation
//!
//! Walks every page of a playlist in order, then merges in the playlist's
//! own metadata. A page error aborts the walk; a metadata failure only
//! leaves the metadata fields at [`UNKNOWN`].

use serde::Serialize;
use tracing::{info, warn};

use crate::models::{PageResult, PlaylistItemSnippet, PlaylistResource};
use crate::{Error, PlaylistSource, Result};

/// Placeholder for metadata the API did not provide.
pub const UNKNOWN: &str = "Unknown";

/// One exported video, in playlist order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEntry {
    pub playlist_position: u32,
    /// When the video was added to the playlist
    pub date_added: String,
    pub video_title: String,
    pub video_id: String,
    /// Uploader's channel; absent for deleted and private videos
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_title: Option<String>,
    pub description: String,
}

impl From<PlaylistItemSnippet> for VideoEntry {
    fn from(snippet: PlaylistItemSnippet) -> Self {
        Self {
            playlist_position: snippet.position,
            date_added: snippet.published_at,
            video_title: snippet.title,
            video_id: snippet.resource_id.video_id,
            channel_id: snippet.video_owner_channel_id,
            channel_title: snippet.video_owner_channel_title,
            description: snippet.description,
        }
    }
}

/// The exported playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub playlist_id: String,
    pub playlist_title: String,
    pub channel_id: String,
    pub channel_title: String,
    /// Playlist creation time
    pub date_created: String,
    pub description: String,
    pub privacy_status: String,
    pub videos: Vec<VideoEntry>,
}

impl Playlist {
    /// Empty playlist with every metadata field set to [`UNKNOWN`].
    pub fn new(playlist_id: impl Into<String>) -> Self {
        Self {
            playlist_id: playlist_id.into(),
            playlist_title: UNKNOWN.to_string(),
            channel_id: UNKNOWN.to_string(),
            channel_title: UNKNOWN.to_string(),
            date_created: UNKNOWN.to_string(),
            description: UNKNOWN.to_string(),
            privacy_status: UNKNOWN.to_string(),
            videos: Vec::new(),
        }
    }

    fn apply_metadata(&mut self, resource: PlaylistResource) {
        let snippet = resource.snippet;
        self.playlist_title = snippet.title;
        self.channel_id = snippet.channel_id;
        self.channel_title = snippet.channel_title;
        self.date_created = snippet.published_at;
        self.description = snippet.description;
        self.privacy_status = resource.status.privacy_status;
    }
}

/// Export a whole playlist from `source`.
///
/// Pages are requested one at a time until a page comes back without a
/// continuation token. Items without a snippet are skipped. An API error on
/// any page is returned as [`Error::Api`] carrying the payload unchanged.
pub async fn index_playlist<S>(source: &S, playlist_id: &str) -> Result<Playlist>
where
    S: PlaylistSource + ?Sized,
{
    let mut playlist = Playlist::new(playlist_id);
    let mut page_token: Option<String> = None;

    info!(playlist_id, "indexing started");
    loop {
        let page = match source.fetch_page(playlist_id, page_token.as_deref()).await? {
            PageResult::Success(page) => page,
            PageResult::Error(error) => {
                warn!(code = error.code, message = %error.message, "playlist page request failed");
                return Err(Error::Api(error));
            }
        };

        let before = playlist.videos.len();
        let mut skipped = 0usize;
        for item in page.items {
            match item.snippet {
                Some(snippet) => playlist.videos.push(VideoEntry::from(snippet)),
                None => skipped += 1,
            }
        }

        let added = &playlist.videos[before..];
        if let (Some(first), Some(last)) = (added.first(), added.last()) {
            info!(
                "Progress: {} - {} / {}",
                first.playlist_position + 1,
                last.playlist_position + 1,
                page.page_info.total_results
            );
        }
        if skipped > 0 {
            warn!(skipped, "skipped playlist items without details");
        }

        // An empty token also marks the last page
        match page.next_page_token.filter(|token| !token.is_empty()) {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    match source.fetch_playlist_info(playlist_id).await {
        Ok(PageResult::Success(info)) => match info.items.into_iter().next() {
            Some(resource) => playlist.apply_metadata(resource),
            None => warn!(playlist_id, "playlist metadata response was empty"),
        },
        Ok(PageResult::Error(error)) => {
            warn!(code = error.code, message = %error.message, "playlist metadata request failed")
        }
        Err(e) => warn!(error = %e, "playlist metadata request failed"),
    }

    info!(videos = playlist.videos.len(), "indexing done");
    Ok(playlist)
}
