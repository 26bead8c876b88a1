//! PKCE (Proof Key for Code Exchange) implementation per RFC 7636
//!
//! Generates the code verifier and S256 challenge used during the OAuth
//! authorization flow. The verifier stays in process memory and is sent
//! during token exchange; the challenge is included in the authorization URL.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use sha2::{Digest, Sha256};

use crate::constants::READ_ONLY_SCOPE;
use crate::error::{Error, Result};
use crate::registration::ClientRegistration;

/// Generate a cryptographically random PKCE code verifier.
///
/// 96 random bytes encode to 128 URL-safe base64 characters, the RFC 7636
/// maximum.
pub fn generate_verifier() -> String {
    let mut bytes = [0u8; 96];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compute the S256 code challenge from a verifier.
///
/// `challenge = BASE64URL(SHA256(verifier))`
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Build the authorization URL for the read-only scope.
///
/// `access_type=offline` makes the provider issue a refresh token alongside
/// the access token. `redirect_uri` is the loopback listener's address.
pub fn build_authorization_url(
    registration: &ClientRegistration,
    redirect_uri: &str,
    challenge: &str,
) -> Result<String> {
    let mut url = reqwest::Url::parse(registration.auth_uri()).map_err(|e| {
        Error::Registration(format!("invalid auth_uri {}: {e}", registration.auth_uri()))
    })?;

    url.query_pairs_mut()
        .append_pair("client_id", &registration.client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("access_type", "offline")
        .append_pair("scope", READ_ONLY_SCOPE)
        .append_pair("code_challenge", challenge)
        .append_pair("code_challenge_method", "S256");

    Ok(url.to_string())
}
