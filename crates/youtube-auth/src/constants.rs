//! Google OAuth constants
//!
//! Endpoint defaults for installed applications. The client registration
//! file may override the authorization and token endpoints.

/// The only scope this tool requests or accepts.
pub const READ_ONLY_SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";

/// Default authorization endpoint when the registration has no `auth_uri`
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Default token endpoint when the registration has no `token_uri`
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// A stored access token closer than this to expiry is refreshed instead of used.
pub const EXPIRY_SKEW_MILLIS: u64 = 5 * 60 * 1000;
