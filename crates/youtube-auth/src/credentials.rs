//! Credential storage for OAuth tokens
//!
//! Manages a JSON file holding a single credential record. The file is read
//! and written wholesale; writes go through `common::write_atomic` so a crash
//! never leaves a half-written token file.
//!
//! Anything that fails to validate (missing file, invalid JSON, wrong shape,
//! wrong scope) is treated as "no credential": the caller falls back to the
//! interactive flow instead of failing.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::{EXPIRY_SKEW_MILLIS, READ_ONLY_SCOPE};
use crate::error::{Error, Result};
use crate::token::TokenResponse;

/// Stored OAuth credentials.
///
/// `expiry_date` is a unix timestamp in milliseconds (absolute, not a delta),
/// computed at storage time from `TokenResponse.expires_in`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token for API calls
    pub access_token: String,
    /// Absent when the provider did not issue one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub scope: String,
    pub token_type: String,
    /// Expiration as unix timestamp in milliseconds
    pub expiry_date: u64,
}

impl Credential {
    /// Build a credential from a token endpoint response.
    ///
    /// Refresh responses usually omit `refresh_token`; `previous_refresh` is
    /// kept in that case so the stored record stays refreshable.
    pub fn from_token_response(
        token: TokenResponse,
        now_millis: u64,
        previous_refresh: Option<String>,
    ) -> Self {
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token.or(previous_refresh),
            scope: token.scope.unwrap_or_else(|| READ_ONLY_SCOPE.to_string()),
            token_type: token.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expiry_date: now_millis.saturating_add(token.expires_in.saturating_mul(1000)),
        }
    }

    /// Whether the granted scope is exactly the read-only scope.
    pub fn has_required_scope(&self) -> bool {
        self.scope == READ_ONLY_SCOPE
    }

    /// Whether the access token stays valid for longer than the expiry skew.
    pub fn is_fresh(&self, now_millis: u64) -> bool {
        self.expiry_date > now_millis.saturating_add(EXPIRY_SKEW_MILLIS)
    }
}

/// Current time as unix milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Single-record credential file.
///
/// No locking: the tool runs as one process with one invocation at a time.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Load the stored credential, or `None` if it is absent or invalid.
    pub async fn load(&self) -> Option<Credential> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "credential file not found");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read credential file");
                return None;
            }
        };

        let credential: Credential = match serde_json::from_str(&contents) {
            Ok(credential) => credential,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "invalid credential file, ignoring");
                return None;
            }
        };

        if !credential.has_required_scope() {
            warn!(
                path = %self.path.display(),
                scope = %credential.scope,
                "stored credential has the wrong scope, ignoring"
            );
            return None;
        }

        debug!(path = %self.path.display(), "loaded stored credential");
        Some(credential)
    }

    /// Serialize and overwrite the credential file.
    ///
    /// File permissions are set to 0600 (owner read/write only) on unix.
    pub async fn save(&self, credential: &Credential) -> Result<()> {
        let json = serde_json::to_string_pretty(credential)
            .map_err(|e| Error::CredentialParse(format!("serializing credential: {e}")))?;

        common::write_atomic(&self.path, json.as_bytes(), Some(0o600))
            .await
            .map_err(|e| Error::Io(format!("writing credential file: {e}")))?;

        info!(path = %self.path.display(), "saved credential");
        Ok(())
    }
}
