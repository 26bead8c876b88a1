//! Loopback redirect listener
//!
//! Binds `127.0.0.1:0` and serves every path. Each incoming request is
//! forwarded to the flow driver as an [`IncomingRedirect`] and the HTTP
//! response waits for the driver's [`RedirectReply`]. The listener makes no
//! decisions of its own: whether a redirect is accepted is decided by the
//! flow state machine.
//!
//! After the first accepted redirect the driver calls [`RedirectListener::close`],
//! which shuts the server down and drops the socket, so later connections
//! are refused.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

const SUCCESS_BODY: &str = "Success! You may now close this window.";
const IGNORED_BODY: &str = "Nothing to see here...";

/// How the driver wants an incoming request answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReply {
    Accepted,
    Ignored,
}

/// A request that reached the listener, with a channel for the answer.
#[derive(Debug)]
pub struct IncomingRedirect {
    pub code: Option<String>,
    pub scope: Option<String>,
    reply: oneshot::Sender<RedirectReply>,
}

impl IncomingRedirect {
    pub fn new(
        code: Option<String>,
        scope: Option<String>,
    ) -> (Self, oneshot::Receiver<RedirectReply>) {
        let (reply, reply_rx) = oneshot::channel();
        (Self { code, scope, reply }, reply_rx)
    }

    /// Answer the HTTP request. A closed connection is not an error.
    pub fn respond(self, reply: RedirectReply) {
        let _ = self.reply.send(reply);
    }
}

/// Router state: the sending half of the redirect queue.
#[derive(Clone)]
struct RedirectState {
    redirects: mpsc::Sender<IncomingRedirect>,
}

/// Build the redirect router. Every path is handled by the same fallback.
fn redirect_router(redirects: mpsc::Sender<IncomingRedirect>) -> Router {
    Router::new()
        .fallback(handle_redirect)
        .with_state(RedirectState { redirects })
}

async fn handle_redirect(
    State(state): State<RedirectState>,
    Query(mut params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let (redirect, reply_rx) = IncomingRedirect::new(params.remove("code"), params.remove("scope"));

    // Dropped receiver or reply sender: the flow has moved on
    let reply = match state.redirects.send(redirect).await {
        Ok(()) => reply_rx.await.unwrap_or(RedirectReply::Ignored),
        Err(_) => RedirectReply::Ignored,
    };

    let body = match reply {
        RedirectReply::Accepted => SUCCESS_BODY,
        RedirectReply::Ignored => IGNORED_BODY,
    };

    (StatusCode::OK, [(header::CONNECTION, "close")], body)
}

/// A live loopback listener serving the redirect router.
pub struct RedirectListener {
    addr: SocketAddr,
    redirects: mpsc::Receiver<IncomingRedirect>,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<std::io::Result<()>>,
}

impl RedirectListener {
    /// Bind an OS-assigned loopback port and start serving.
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .map_err(|e| Error::Listener(format!("binding loopback listener: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| Error::Listener(format!("reading listener address: {e}")))?;

        let (redirect_tx, redirect_rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = redirect_router(redirect_tx);

        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!(addr = %addr, "listening for OAuth redirect");
        Ok(Self {
            addr,
            redirects: redirect_rx,
            shutdown: shutdown_tx,
            server,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Redirect URI to register in the authorization URL.
    pub fn redirect_uri(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Wait for the next request. There is no timeout.
    pub async fn next_redirect(&mut self) -> Result<IncomingRedirect> {
        self.redirects
            .recv()
            .await
            .ok_or_else(|| Error::Listener("listener stopped before a redirect arrived".into()))
    }

    /// Shut the server down and release the port.
    ///
    /// Queued requests are dropped first, so their handlers answer
    /// "nothing here" and graceful shutdown does not wait on them.
    pub async fn close(self) {
        let Self {
            addr,
            redirects,
            shutdown,
            server,
        } = self;
        drop(redirects);
        let _ = shutdown.send(());

        match server.await {
            Ok(Ok(())) => info!(addr = %addr, "closed redirect listener"),
            Ok(Err(e)) => warn!(addr = %addr, error = %e, "redirect listener error during shutdown"),
            Err(e) => warn!(addr = %addr, error = %e, "redirect listener task panicked"),
        }
        debug!(addr = %addr, "redirect listener released");
    }
}
