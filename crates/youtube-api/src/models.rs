//! Wire types for the `playlistItems` and `playlists` endpoints
//!
//! Only the fields the export reads are modelled; everything else in the
//! response is ignored.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Error payload returned by the API in place of a page:
/// `{"error": {"code": .., "message": .., "errors": [..]}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
    /// Sub-errors, kept verbatim
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

/// One API response: the requested resource or the API's error payload.
#[derive(Debug, Clone, PartialEq)]
pub enum PageResult<T> {
    Success(T),
    Error(ApiError),
}

impl<T: DeserializeOwned> PageResult<T> {
    /// Parse a response body. A top-level `error` key selects the error variant.
    pub fn from_body(body: &str) -> serde_json::Result<Self> {
        let mut value: serde_json::Value = serde_json::from_str(body)?;

        if let Some(error) = value.get_mut("error") {
            let error = serde_json::from_value(error.take())?;
            return Ok(PageResult::Error(error));
        }

        serde_json::from_value(value).map(PageResult::Success)
    }
}

/// `playlistItems.list` response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemsPage {
    /// Continuation token; absent on the last page
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub page_info: PageInfo,
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub total_results: u32,
    #[serde(default)]
    pub results_per_page: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaylistItem {
    /// Missing when the item's detail is unavailable
    #[serde(default)]
    pub snippet: Option<PlaylistItemSnippet>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    /// When the video was added to the playlist
    pub published_at: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Zero-based position within the playlist
    pub position: u32,
    pub resource_id: ResourceId,
    /// Absent for deleted and private videos
    #[serde(default)]
    pub video_owner_channel_id: Option<String>,
    #[serde(default)]
    pub video_owner_channel_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub video_id: String,
}

/// `playlists.list` response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaylistListResponse {
    #[serde(default)]
    pub items: Vec<PlaylistResource>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaylistResource {
    pub snippet: PlaylistSnippet,
    pub status: PlaylistStatus,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSnippet {
    /// Playlist creation time
    pub published_at: String,
    pub channel_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub channel_title: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistStatus {
    pub privacy_status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEMS_PAGE: &str = r#"{
        "kind": "youtube#playlistItemListResponse",
        "etag": "abc",
        "nextPageToken": "EAAaBlBUOkNESQ",
        "items": [
            {
                "kind": "youtube#playlistItem",
                "id": "UEx1",
                "snippet": {
                    "publishedAt": "2023-05-01T10:00:00Z",
                    "channelId": "UCowner",
                    "title": "First video",
                    "description": "desc",
                    "thumbnails": {},
                    "channelTitle": "Me",
                    "playlistId": "PL123",
                    "position": 0,
                    "resourceId": {"kind": "youtube#video", "videoId": "dQw4w9WgXcQ"},
                    "videoOwnerChannelTitle": "Uploader",
                    "videoOwnerChannelId": "UCuploader"
                }
            },
            {"kind": "youtube#playlistItem", "id": "UEx2"}
        ],
        "pageInfo": {"totalResults": 120, "resultsPerPage": 50}
    }"#;

    #[test]
    fn parses_items_page() {
        let page = match PageResult::<PlaylistItemsPage>::from_body(ITEMS_PAGE).unwrap() {
            PageResult::Success(page) => page,
            PageResult::Error(e) => panic!("unexpected error payload: {e:?}"),
        };
        assert_eq!(page.next_page_token.as_deref(), Some("EAAaBlBUOkNESQ"));
        assert_eq!(page.page_info.total_results, 120);
        assert_eq!(page.items.len(), 2);

        let snippet = page.items[0].snippet.as_ref().unwrap();
        assert_eq!(snippet.position, 0);
        assert_eq!(snippet.resource_id.video_id, "dQw4w9WgXcQ");
        assert_eq!(snippet.video_owner_channel_id.as_deref(), Some("UCuploader"));
        assert!(page.items[1].snippet.is_none());
    }

    #[test]
    fn last_page_has_no_token() {
        let body = r#"{"items": [], "pageInfo": {"totalResults": 0, "resultsPerPage": 50}}"#;
        match PageResult::<PlaylistItemsPage>::from_body(body).unwrap() {
            PageResult::Success(page) => assert!(page.next_page_token.is_none()),
            PageResult::Error(e) => panic!("unexpected error payload: {e:?}"),
        }
    }

    #[test]
    fn deleted_video_has_no_owner() {
        let body = r#"{"items": [{"snippet": {
            "publishedAt": "2023-05-01T10:00:00Z",
            "title": "Deleted video",
            "description": "This video is unavailable.",
            "position": 3,
            "resourceId": {"kind": "youtube#video", "videoId": "gone"}
        }}]}"#;
        let PageResult::Success(page) = PageResult::<PlaylistItemsPage>::from_body(body).unwrap()
        else {
            panic!("expected a page");
        };
        let snippet = page.items[0].snippet.as_ref().unwrap();
        assert!(snippet.video_owner_channel_id.is_none());
        assert!(snippet.video_owner_channel_title.is_none());
    }

    #[test]
    fn error_payload_selects_error_variant() {
        let body = r#"{"error": {
            "code": 404,
            "message": "The playlist identified with the request's playlistId parameter cannot be found.",
            "errors": [{"message": "not found", "domain": "youtube.playlistItem", "reason": "playlistNotFound", "location": "playlistId", "locationType": "parameter"}]
        }}"#;
        let PageResult::Error(error) = PageResult::<PlaylistItemsPage>::from_body(body).unwrap()
        else {
            panic!("expected an error payload");
        };
        assert_eq!(error.code, 404);
        assert_eq!(error.errors.len(), 1);
        assert_eq!(error.errors[0]["reason"], "playlistNotFound");
    }

    #[test]
    fn non_json_body_is_decode_error() {
        assert!(PageResult::<PlaylistItemsPage>::from_body("<html>502</html>").is_err());
    }

    #[test]
    fn parses_playlist_metadata() {
        let body = r#"{"items": [{
            "kind": "youtube#playlist",
            "id": "PL123",
            "snippet": {
                "publishedAt": "2020-02-02T02:02:02Z",
                "channelId": "UCme",
                "title": "My Mix",
                "description": "",
                "channelTitle": "Me",
                "localized": {"title": "My Mix", "description": ""}
            },
            "status": {"privacyStatus": "private"}
        }]}"#;
        let PageResult::Success(info) = PageResult::<PlaylistListResponse>::from_body(body).unwrap()
        else {
            panic!("expected metadata");
        };
        assert_eq!(info.items[0].snippet.title, "My Mix");
        assert_eq!(info.items[0].status.privacy_status, "private");
    }
}
