//! HTTP client for the playlist endpoints
//!
//! One GET per call, no retry. The response body is parsed regardless of
//! status: the API reports failures as a JSON error payload, which comes back
//! as `PageResult::Error`.

use std::future::Future;
use std::pin::Pin;

use common::Secret;
use reqwest::Url;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::models::{PageResult, PlaylistItemsPage, PlaylistListResponse};
use crate::{Error, PlaylistSource, Result};

/// Largest page the API serves.
pub const MAX_PAGE_SIZE: u8 = 50;

/// Authenticated client for one access token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Secret<String>,
    page_size: u8,
}

impl ApiClient {
    /// `base_url` is the API root, e.g. `https://youtube.googleapis.com/youtube/v3`.
    /// `page_size` is clamped to `1..=50`.
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        access_token: String,
        page_size: u8,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: Secret::new(access_token),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page_size(&self) -> u8 {
        self.page_size
    }

    fn endpoint(&self, resource: &str) -> Result<Url> {
        let raw = format!("{}/{resource}", self.base_url);
        Url::parse(&raw).map_err(|e| Error::Http(format!("invalid endpoint {raw}: {e}")))
    }

    /// `GET playlistItems?part=snippet&playlistId=..&maxResults=..[&pageToken=..]`
    pub async fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PageResult<PlaylistItemsPage>> {
        let mut url = self.endpoint("playlistItems")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("part", "snippet")
                .append_pair("playlistId", playlist_id)
                .append_pair("maxResults", &self.page_size.to_string());
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        self.get(url).await
    }

    /// `GET playlists?part=snippet&part=status&id=..&maxResults=1`
    pub async fn playlist_info(&self, playlist_id: &str) -> Result<PageResult<PlaylistListResponse>> {
        let mut url = self.endpoint("playlists")?;
        url.query_pairs_mut()
            .append_pair("part", "snippet")
            .append_pair("part", "status")
            .append_pair("id", playlist_id)
            .append_pair("maxResults", "1");
        self.get(url).await
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<PageResult<T>> {
        debug!(path = %url.path(), "GET");

        let response = self
            .http
            .get(url)
            .bearer_auth(self.access_token.expose())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("reading response body: {e}")))?;

        PageResult::from_body(&body)
            .map_err(|e| Error::Decode(format!("status {status}: {e}")))
    }
}

impl PlaylistSource for ApiClient {
    fn fetch_page<'a>(
        &'a self,
        playlist_id: &'a str,
        page_token: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<PageResult<PlaylistItemsPage>>> + Send + 'a>> {
        Box::pin(self.playlist_items(playlist_id, page_token))
    }

    fn fetch_playlist_info<'a>(
        &'a self,
        playlist_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<PageResult<PlaylistListResponse>>> + Send + 'a>> {
        Box::pin(self.playlist_info(playlist_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::Json;
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use tokio::net::TcpListener;

    type Seen = Arc<Mutex<Vec<Vec<(String, String)>>>>;

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer ya29.test")
            && headers.get("accept").and_then(|v| v.to_str().ok()) == Some("application/json")
    }

    fn unauthorized() -> (StatusCode, Json<serde_json::Value>) {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": {
                "code": 401,
                "message": "Request had invalid authentication credentials.",
                "errors": [{"reason": "authError"}]
            }})),
        )
    }

    fn item(position: u32) -> serde_json::Value {
        serde_json::json!({"snippet": {
            "publishedAt": "2023-05-01T10:00:00Z",
            "title": format!("video {position}"),
            "description": "",
            "position": position,
            "resourceId": {"kind": "youtube#video", "videoId": format!("vid{position}")},
            "videoOwnerChannelId": "UCowner",
            "videoOwnerChannelTitle": "Owner"
        }})
    }

    async fn playlist_items(
        State(seen): State<Seen>,
        headers: HeaderMap,
        Query(query): Query<Vec<(String, String)>>,
    ) -> impl IntoResponse {
        seen.lock().unwrap().push(query.clone());
        if !authorized(&headers) {
            return unauthorized();
        }
        let token = query.iter().find(|(k, _)| k == "pageToken").map(|(_, v)| v.as_str());
        let body = match token {
            None => serde_json::json!({
                "nextPageToken": "PAGE2",
                "pageInfo": {"totalResults": 3, "resultsPerPage": 2},
                "items": [item(0), item(1)]
            }),
            Some("PAGE2") => serde_json::json!({
                "pageInfo": {"totalResults": 3, "resultsPerPage": 2},
                "items": [item(2)]
            }),
            Some(_) => serde_json::json!({"error": {
                "code": 400, "message": "Invalid page token.", "errors": []
            }}),
        };
        (StatusCode::OK, Json(body))
    }

    async fn playlists(
        State(seen): State<Seen>,
        headers: HeaderMap,
        Query(query): Query<Vec<(String, String)>>,
    ) -> impl IntoResponse {
        seen.lock().unwrap().push(query);
        if !authorized(&headers) {
            return unauthorized();
        }
        (
            StatusCode::OK,
            Json(serde_json::json!({"items": [{
                "snippet": {
                    "publishedAt": "2020-02-02T02:02:02Z",
                    "channelId": "UCme",
                    "title": "My Mix",
                    "description": "songs",
                    "channelTitle": "Me"
                },
                "status": {"privacyStatus": "private"}
            }]})),
        )
    }

    async fn start_api_server() -> (String, Seen) {
        let seen: Seen = Arc::default();
        let app = axum::Router::new()
            .route("/youtube/v3/playlistItems", get(playlist_items))
            .route("/youtube/v3/playlists", get(playlists))
            .route("/broken/playlistItems", get(|| async { "<html>bad gateway</html>" }))
            .with_state(seen.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    fn client(base: &str, token: &str) -> ApiClient {
        ApiClient::new(reqwest::Client::new(), format!("{base}/youtube/v3"), token.into(), 50)
    }

    fn param<'a>(query: &'a [(String, String)], key: &str) -> Vec<&'a str> {
        query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[test]
    fn page_size_is_clamped() {
        let http = reqwest::Client::new();
        assert_eq!(ApiClient::new(http.clone(), "http://x", "t".into(), 0).page_size(), 1);
        assert_eq!(ApiClient::new(http.clone(), "http://x", "t".into(), 200).page_size(), 50);
        assert_eq!(ApiClient::new(http, "http://x", "t".into(), 25).page_size(), 25);
    }

    #[test]
    fn debug_redacts_access_token() {
        let api = ApiClient::new(reqwest::Client::new(), "http://x", "ya29.secret".into(), 50);
        assert!(!format!("{api:?}").contains("ya29.secret"));
    }

    #[tokio::test]
    async fn first_page_request_omits_page_token() {
        let (base, seen) = start_api_server().await;
        let api = client(&base, "ya29.test");

        let result = api.playlist_items("PL123", None).await.unwrap();
        let PageResult::Success(page) = result else {
            panic!("expected a page, got {result:?}");
        };
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_page_token.as_deref(), Some("PAGE2"));

        let query = seen.lock().unwrap()[0].clone();
        assert_eq!(param(&query, "part"), vec!["snippet"]);
        assert_eq!(param(&query, "playlistId"), vec!["PL123"]);
        assert_eq!(param(&query, "maxResults"), vec!["50"]);
        assert!(param(&query, "pageToken").is_empty());
    }

    #[tokio::test]
    async fn continuation_request_sends_page_token() {
        let (base, seen) = start_api_server().await;
        let api = client(&base, "ya29.test");

        let result = api.playlist_items("PL123", Some("PAGE2")).await.unwrap();
        let PageResult::Success(page) = result else {
            panic!("expected a page, got {result:?}");
        };
        assert!(page.next_page_token.is_none());

        let query = seen.lock().unwrap()[0].clone();
        assert_eq!(param(&query, "pageToken"), vec!["PAGE2"]);
    }

    #[tokio::test]
    async fn metadata_request_asks_for_snippet_and_status() {
        let (base, seen) = start_api_server().await;
        let api = client(&base, "ya29.test");

        let result = api.playlist_info("PL123").await.unwrap();
        let PageResult::Success(info) = result else {
            panic!("expected metadata, got {result:?}");
        };
        assert_eq!(info.items[0].snippet.title, "My Mix");

        let query = seen.lock().unwrap()[0].clone();
        assert_eq!(param(&query, "part"), vec!["snippet", "status"]);
        assert_eq!(param(&query, "id"), vec!["PL123"]);
        assert_eq!(param(&query, "maxResults"), vec!["1"]);
    }

    #[tokio::test]
    async fn rejected_token_yields_error_payload() {
        let (base, _) = start_api_server().await;
        let api = client(&base, "ya29.wrong");

        let result = api.playlist_items("PL123", None).await.unwrap();
        let PageResult::Error(error) = result else {
            panic!("expected an error payload, got {result:?}");
        };
        assert_eq!(error.code, 401);
        assert_eq!(error.errors, vec![serde_json::json!({"reason": "authError"})]);
    }

    #[tokio::test]
    async fn non_json_body_is_decode_error() {
        let (base, _) = start_api_server().await;
        let api = ApiClient::new(reqwest::Client::new(), format!("{base}/broken"), "t".into(), 50);

        let err = api.playlist_items("PL123", None).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn unreachable_server_is_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = client(&format!("http://{addr}"), "ya29.test");
        let err = api.playlist_items("PL123", None).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn index_playlist_over_http() {
        let (base, _) = start_api_server().await;
        let api = client(&base, "ya29.test");

        let playlist = crate::index_playlist(&api, "PL123").await.unwrap();
        let positions: Vec<u32> = playlist.videos.iter().map(|v| v.playlist_position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(playlist.playlist_title, "My Mix");
        assert_eq!(playlist.privacy_status, "private");
    }
}
