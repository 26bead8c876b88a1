//! YouTube OAuth authentication library
//!
//! Provides the installed-application OAuth flow for the read-only YouTube
//! scope: client registration loading, PKCE, token exchange/refresh, the
//! loopback redirect listener and credential file storage. The crate has no
//! dependency on the export binary and can be tested on its own.
//!
//! Credential flow:
//! 1. `CredentialStore::load()` returns a stored credential with the right scope
//! 2. If it is still fresh (or refreshable via `token::refresh_token()`), done
//! 3. Otherwise `callback::RedirectListener::bind()` opens a loopback port
//! 4. User authorizes via `pkce::build_authorization_url()` in their browser
//! 5. The redirect delivers a code, exchanged via `token::exchange_code()`
//! 6. The new credential is saved via `CredentialStore::save()`
//!
//! `flow::Authenticator` drives steps 1-6 through the pure state machine in
//! `flow::handle_event`.

pub mod callback;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod flow;
pub mod pkce;
pub mod registration;
pub mod token;

pub use constants::*;
pub use credentials::{Credential, CredentialStore};
pub use error::{Error, Result};
pub use flow::{Authenticator, BrowserLauncher, SystemBrowser};
pub use pkce::{build_authorization_url, compute_challenge, generate_verifier};
pub use registration::ClientRegistration;
pub use token::{TokenResponse, exchange_code, refresh_token};
