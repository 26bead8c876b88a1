//! YouTube Data API v3 playlist access
//!
//! Defines the `PlaylistSource` trait that decouples aggregation from HTTP.
//! `ApiClient` implements it against the real `playlistItems` and `playlists`
//! endpoints; `index_playlist` walks every page of a playlist through any
//! source and folds the results into a [`Playlist`].

pub mod client;
pub mod models;
pub mod playlist;

pub use client::ApiClient;
pub use models::{ApiError, PageResult, PlaylistItemsPage, PlaylistListResponse};
pub use playlist::{Playlist, UNKNOWN, VideoEntry, index_playlist};

use std::future::Future;
use std::pin::Pin;

/// Errors from playlist fetching.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure: connection refused, TLS, timeout
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Response body was neither a page nor an error payload
    #[error("invalid API response: {0}")]
    Decode(String),

    /// The API answered with an error payload
    #[error("API error {}: {}", .0.code, .0.message)]
    Api(ApiError),
}

/// Result alias for API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Where playlist pages come from.
///
/// A transport or decode failure is `Err`; an error payload from the API is
/// `Ok(PageResult::Error(..))` so callers decide whether it is fatal.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`&dyn PlaylistSource`).
pub trait PlaylistSource: Send + Sync {
    /// Fetch one page of playlist items. `page_token` is `None` for the first page.
    fn fetch_page<'a>(
        &'a self,
        playlist_id: &'a str,
        page_token: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<PageResult<PlaylistItemsPage>>> + Send + 'a>>;

    /// Fetch the playlist's own metadata (title, owner, privacy).
    fn fetch_playlist_info<'a>(
        &'a self,
        playlist_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<PageResult<PlaylistListResponse>>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_code_and_message() {
        let err = Error::Api(ApiError {
            code: 404,
            message: "The playlist identified with the request's playlistId parameter cannot be found.".into(),
            errors: vec![],
        });
        let msg = err.to_string();
        assert!(msg.starts_with("API error 404: "), "got: {msg}");
        assert!(msg.contains("cannot be found"));
    }

    #[test]
    fn transport_error_display() {
        let err = Error::Http("connection refused".into());
        assert_eq!(err.to_string(), "HTTP request failed: connection refused");
    }
}
