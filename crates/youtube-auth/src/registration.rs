//! OAuth client registration
//!
//! The operator downloads the "installed application" client file from the
//! Google Cloud console and places it next to the binary. It is read once
//! per process and passed explicitly to the authenticator.

use std::path::Path;

use common::Secret;
use serde::Deserialize;
use tracing::info;

use crate::constants::{DEFAULT_AUTH_URI, DEFAULT_TOKEN_URI};
use crate::error::{Error, Result};

/// On-disk shape: the registration is nested under `installed`.
#[derive(Deserialize)]
struct RegistrationFile {
    installed: ClientRegistration,
}

/// Registered OAuth client for an installed application.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientRegistration {
    pub client_id: String,
    pub client_secret: Secret<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    /// Authorization endpoint override
    #[serde(default)]
    pub auth_uri: Option<String>,
    /// Token endpoint override
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl ClientRegistration {
    /// Load the registration from a client file.
    ///
    /// A missing or malformed file is a configuration error: the caller
    /// aborts before any network activity.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Registration(format!("reading client file {}: {e}", path.display()))
        })?;
        let registration = Self::from_json(&contents)?;
        info!(
            path = %path.display(),
            client_id = %registration.client_id,
            project_id = registration.project_id.as_deref().unwrap_or("-"),
            "loaded client registration"
        );
        Ok(registration)
    }

    /// Parse a registration from the client file's JSON contents.
    pub fn from_json(contents: &str) -> Result<Self> {
        let file: RegistrationFile = serde_json::from_str(contents)
            .map_err(|e| Error::Registration(format!("parsing client file: {e}")))?;
        let registration = file.installed;

        if registration.client_id.trim().is_empty() {
            return Err(Error::Registration("client_id is empty".into()));
        }
        if registration.client_secret.expose().trim().is_empty() {
            return Err(Error::Registration("client_secret is empty".into()));
        }

        Ok(registration)
    }

    /// Authorization endpoint, falling back to Google's default.
    pub fn auth_uri(&self) -> &str {
        self.auth_uri.as_deref().unwrap_or(DEFAULT_AUTH_URI)
    }

    /// Token endpoint, falling back to Google's default.
    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }
}
