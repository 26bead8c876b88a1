//! Authorization flow state machine
//!
//! Pure state machine: receives events, returns (new_state, action).
//! [`Authenticator::access_token`] executes the I/O implied by each action
//! and feeds the outcome back as the next event.
//!
//! ```text
//! Idle ──stored token ok──────────────────────────────────▶ Complete
//!  │
//!  └─bind─▶ Listening ─url shown─▶ AwaitingRedirect ─code─▶ Exchanging ─▶ Complete
//!                                    ▲          │                 │
//!                                    └─ignored──┘                 └────▶ Failed
//! ```

use std::process::Command;

use tracing::{debug, info, warn};

use crate::callback::{IncomingRedirect, RedirectListener, RedirectReply};
use crate::constants::READ_ONLY_SCOPE;
use crate::credentials::{Credential, CredentialStore, now_millis};
use crate::error::{Error, Result};
use crate::pkce::{build_authorization_url, compute_challenge, generate_verifier};
use crate::registration::ClientRegistration;
use crate::token::{exchange_code, refresh_token};

/// Flow states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Nothing bound yet
    Idle,
    /// Loopback listener bound, authorization URL not yet shown
    Listening { redirect_uri: String },
    /// Waiting for the provider to redirect the browser back
    AwaitingRedirect { redirect_uri: String },
    /// Trading the authorization code for tokens
    Exchanging { redirect_uri: String },
    /// Terminal: an access token is available
    Complete,
    /// Terminal: the flow cannot continue
    Failed { error: String },
}

/// Events that drive state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A stored credential produced a usable access token
    StoredTokenAccepted { access_token: String },
    /// No stored credential, or it could not be used
    StoredTokenUnavailable,
    /// Loopback listener bound
    ListenerBound { redirect_uri: String },
    /// Listener could not bind, or stopped while waiting
    ListenerFailed(String),
    /// Authorization URL shown to the user
    UrlPresented,
    /// Authorization URL could not be built
    PresentFailed(String),
    /// A request reached the listener
    RedirectReceived {
        code: Option<String>,
        scope: Option<String>,
    },
    /// Token endpoint issued tokens
    TokensIssued { access_token: String },
    /// Token endpoint rejected the code or was unreachable
    ExchangeFailed(String),
}

/// Actions the driver should execute after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    /// Bind the loopback listener
    BindListener,
    /// Build the authorization URL for this redirect URI and open it
    PresentUrl { redirect_uri: String },
    /// Wait for the next request on the listener
    AwaitRedirect,
    /// Answer the pending request with "nothing here", then keep waiting
    IgnoreRedirect,
    /// Answer the pending request with success, close the listener, exchange the code
    ExchangeCode { code: String, redirect_uri: String },
    /// Resolve the flow with this token
    Finish { access_token: String },
    /// Resolve the flow with an error
    Abort { error: String },
    /// No-op
    None,
}

/// Handle a state transition. Pure function: no I/O.
pub fn handle_event(state: AuthState, event: AuthEvent) -> (AuthState, AuthAction) {
    match (state, event) {
        // --- Idle ---
        (AuthState::Idle, AuthEvent::StoredTokenAccepted { access_token }) => {
            (AuthState::Complete, AuthAction::Finish { access_token })
        }

        (AuthState::Idle, AuthEvent::StoredTokenUnavailable) => {
            (AuthState::Idle, AuthAction::BindListener)
        }

        (AuthState::Idle, AuthEvent::ListenerBound { redirect_uri }) => (
            AuthState::Listening {
                redirect_uri: redirect_uri.clone(),
            },
            AuthAction::PresentUrl { redirect_uri },
        ),

        // --- Listening ---
        (AuthState::Listening { redirect_uri }, AuthEvent::UrlPresented) => (
            AuthState::AwaitingRedirect { redirect_uri },
            AuthAction::AwaitRedirect,
        ),

        (AuthState::Listening { .. }, AuthEvent::PresentFailed(error)) => (
            AuthState::Failed {
                error: error.clone(),
            },
            AuthAction::Abort { error },
        ),

        // --- AwaitingRedirect ---
        (
            AuthState::AwaitingRedirect { redirect_uri },
            AuthEvent::RedirectReceived {
                code: Some(code),
                scope: Some(scope),
            },
        ) if scope == READ_ONLY_SCOPE => (
            AuthState::Exchanging {
                redirect_uri: redirect_uri.clone(),
            },
            AuthAction::ExchangeCode { code, redirect_uri },
        ),

        (AuthState::AwaitingRedirect { redirect_uri }, AuthEvent::RedirectReceived { .. }) => (
            AuthState::AwaitingRedirect { redirect_uri },
            AuthAction::IgnoreRedirect,
        ),

        // --- Exchanging ---
        (AuthState::Exchanging { .. }, AuthEvent::TokensIssued { access_token }) => {
            (AuthState::Complete, AuthAction::Finish { access_token })
        }

        (AuthState::Exchanging { .. }, AuthEvent::ExchangeFailed(error)) => (
            AuthState::Failed {
                error: error.clone(),
            },
            AuthAction::Abort { error },
        ),

        // --- Listener failures ---
        (
            AuthState::Idle | AuthState::AwaitingRedirect { .. },
            AuthEvent::ListenerFailed(error),
        ) => (
            AuthState::Failed {
                error: error.clone(),
            },
            AuthAction::Abort { error },
        ),

        // --- Invalid/unhandled transition: stay in current state ---
        (state, _event) => (state, AuthAction::None),
    }
}

/// Keep the typed error for the caller and hand its message to the state machine.
fn record(failure: &mut Option<Error>, error: Error) -> String {
    let message = error.to_string();
    *failure = Some(error);
    message
}

/// Opens the authorization URL for the user.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// Opens URLs with the platform's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        #[cfg(target_os = "windows")]
        let mut command = {
            let mut cmd = Command::new("rundll32.exe");
            cmd.arg("url.dll,FileProtocolHandler");
            cmd
        };

        #[cfg(target_os = "macos")]
        let mut command = Command::new("open");

        #[cfg(all(unix, not(target_os = "macos")))]
        let mut command = Command::new("xdg-open");

        command.arg(url).spawn().map(|_| ())
    }
}

/// Obtains an access token for the read-only scope.
///
/// Holds everything the flow needs explicitly: no process-wide state.
pub struct Authenticator<B: BrowserLauncher = SystemBrowser> {
    http: reqwest::Client,
    registration: ClientRegistration,
    store: CredentialStore,
    browser: B,
}

impl<B: BrowserLauncher> Authenticator<B> {
    pub fn new(
        http: reqwest::Client,
        registration: ClientRegistration,
        store: CredentialStore,
        browser: B,
    ) -> Self {
        Self {
            http,
            registration,
            store,
            browser,
        }
    }

    /// Run the flow to completion and return an access token.
    ///
    /// Reuses the stored credential when possible; otherwise runs the
    /// interactive browser flow. Waits for the redirect without a timeout.
    pub async fn access_token(&self) -> Result<String> {
        let first = match self.stored_access_token().await {
            Some(access_token) => AuthEvent::StoredTokenAccepted { access_token },
            None => AuthEvent::StoredTokenUnavailable,
        };
        let (mut state, mut action) = handle_event(AuthState::Idle, first);

        let verifier = generate_verifier();
        let mut listener: Option<RedirectListener> = None;
        let mut pending: Option<IncomingRedirect> = None;
        let mut failure: Option<Error> = None;

        loop {
            debug!(?state, ?action, "authorization flow transition");

            let event = match action {
                AuthAction::Finish { access_token } => {
                    info!("authorization complete");
                    return Ok(access_token);
                }

                AuthAction::Abort { error } => {
                    if let Some(active) = listener.take() {
                        active.close().await;
                    }
                    return Err(failure.take().unwrap_or_else(|| Error::Flow(error)));
                }

                AuthAction::None => {
                    return Err(Error::Flow(format!("no transition out of {state:?}")));
                }

                AuthAction::BindListener => match RedirectListener::bind().await {
                    Ok(bound) => {
                        let redirect_uri = bound.redirect_uri();
                        listener = Some(bound);
                        AuthEvent::ListenerBound { redirect_uri }
                    }
                    Err(e) => AuthEvent::ListenerFailed(record(&mut failure, e)),
                },

                AuthAction::PresentUrl { redirect_uri } => {
                    let challenge = compute_challenge(&verifier);
                    match build_authorization_url(&self.registration, &redirect_uri, &challenge) {
                        Ok(url) => {
                            self.present(&url);
                            AuthEvent::UrlPresented
                        }
                        Err(e) => AuthEvent::PresentFailed(record(&mut failure, e)),
                    }
                }

                AuthAction::AwaitRedirect | AuthAction::IgnoreRedirect => {
                    if let Some(redirect) = pending.take() {
                        debug!("ignoring request without a valid authorization code");
                        redirect.respond(RedirectReply::Ignored);
                    }
                    let active = listener
                        .as_mut()
                        .ok_or_else(|| Error::Flow("awaiting redirect without a listener".into()))?;
                    match active.next_redirect().await {
                        Ok(redirect) => {
                            let event = AuthEvent::RedirectReceived {
                                code: redirect.code.clone(),
                                scope: redirect.scope.clone(),
                            };
                            pending = Some(redirect);
                            event
                        }
                        Err(e) => AuthEvent::ListenerFailed(record(&mut failure, e)),
                    }
                }

                AuthAction::ExchangeCode { code, redirect_uri } => {
                    if let Some(redirect) = pending.take() {
                        redirect.respond(RedirectReply::Accepted);
                    }
                    if let Some(active) = listener.take() {
                        active.close().await;
                    }

                    match self.redeem(&code, &redirect_uri, &verifier).await {
                        Ok(access_token) => AuthEvent::TokensIssued { access_token },
                        Err(e) => AuthEvent::ExchangeFailed(record(&mut failure, e)),
                    }
                }
            };

            (state, action) = handle_event(state, event);
        }
    }

    /// Trade an authorization code for tokens and store them.
    async fn redeem(&self, code: &str, redirect_uri: &str, verifier: &str) -> Result<String> {
        let token =
            exchange_code(&self.http, &self.registration, code, redirect_uri, verifier).await?;
        let credential = Credential::from_token_response(token, now_millis(), None);
        self.persist(&credential).await;
        Ok(credential.access_token)
    }

    /// Try the stored credential, refreshing it if it is close to expiry.
    async fn stored_access_token(&self) -> Option<String> {
        let credential = self.store.load().await?;
        let now = now_millis();

        if credential.is_fresh(now) {
            info!("valid stored credential found");
            return Some(credential.access_token);
        }

        let Some(refresh) = credential.refresh_token.as_deref() else {
            info!("stored access token expired and no refresh token is available");
            return None;
        };

        match refresh_token(&self.http, &self.registration, refresh).await {
            Ok(token) => {
                let refreshed =
                    Credential::from_token_response(token, now, credential.refresh_token.clone());
                self.persist(&refreshed).await;
                info!("refreshed stored credential");
                Some(refreshed.access_token)
            }
            Err(e) => {
                warn!(error = %e, "stored credential could not be refreshed, starting browser authorization");
                None
            }
        }
    }

    /// A token that cannot be saved is still usable for this run.
    async fn persist(&self, credential: &Credential) {
        if let Err(e) = self.store.save(credential).await {
            warn!(path = %self.store.path().display(), error = %e, "failed to persist credential");
        }
    }

    fn present(&self, url: &str) {
        match self.browser.open(url) {
            Ok(()) => info!(
                url = %url,
                "a page should have opened in your browser, if not open the URL manually"
            ),
            Err(e) => warn!(
                url = %url,
                error = %e,
                "could not open a browser, open the URL manually"
            ),
        }
    }
}
