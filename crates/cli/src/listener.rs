// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loopback HTTP listener for the identity provider's form-POST redirect.
//!
//! Accepts exactly one trusted callback per login attempt. The handler never
//! touches the process lifecycle: it reports a [`CallbackOutcome`] over the
//! session's completion channel and leaves the exit decision to the
//! orchestrator.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::TokenCache;
use crate::claims;
use crate::error::LoginError;
use crate::session::{CallbackOutcome, Session};

/// Port of the redirect URI registered with the identity provider.
pub const REDIRECT_PORT: u16 = 16993;
pub const REDIRECT_PATH: &str = "/redirect";
pub const REDIRECT_URI: &str = "http://localhost:16993/redirect";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const MAX_BODY_BYTES: usize = 64 * 1024;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);
const CONFIRMATION_PAGE: &str = "Authentication complete. You may close this browser tab.";

/// Shared state of one listening attempt.
pub struct CallbackState {
    session: Session,
    cache: TokenCache,
    environment: String,
    completed: AtomicBool,
}

impl CallbackState {
    pub fn new(session: Session, cache: TokenCache, environment: impl Into<String>) -> Self {
        Self { session, cache, environment: environment.into(), completed: AtomicBool::new(false) }
    }
}

/// Handle to a running listener. Dropping it does not stop the server; call
/// [`ListenerHandle::shutdown`].
pub struct ListenerHandle {
    addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Graceful shutdown, bounded: in-flight responses get up to one second,
    /// then the serve task is aborted.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut self.task).await.is_err() {
            warn!("listener did not stop within grace period, aborting");
            self.task.abort();
        }
    }
}

/// Bind `addr` and start serving callbacks. The socket is bound before this
/// returns, so once the caller holds a handle it is safe to send the user's
/// browser to the redirect URI.
pub async fn spawn(addr: SocketAddr, state: Arc<CallbackState>) -> std::io::Result<ListenerHandle> {
    let tcp = TcpListener::bind(addr).await?;
    let addr = tcp.local_addr()?;
    let shutdown = CancellationToken::new();

    let router = Router::new().fallback(handle_callback).with_state(state);
    let sd = shutdown.clone();
    let task = tokio::spawn(async move {
        let result = axum::serve(tcp, router).with_graceful_shutdown(sd.cancelled_owned()).await;
        if let Err(e) = result {
            error!("callback listener error: {e}");
        }
    });

    info!(%addr, "callback listener bound");
    Ok(ListenerHandle { addr, shutdown, task })
}

/// The whole redirect state machine lives in this one handler so the check
/// ordering stays explicit: method, path, headers, body, token, nonce.
async fn handle_callback(State(state): State<Arc<CallbackState>>, req: Request) -> Response {
    let (parts, body) = req.into_parts();

    if parts.method != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    if parts.uri.path() != REDIRECT_PATH {
        debug!(path = %parts.uri.path(), "POST to unrelated path, ignoring");
        return StatusCode::OK.into_response();
    }

    let content_type =
        parts.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or("");
    if parts.headers.get(header::CONTENT_LENGTH).is_none() || content_type != FORM_CONTENT_TYPE {
        return bad_request("Content-Length or Content-Type not provided or invalid");
    }

    let Ok(body) = to_bytes(body, MAX_BODY_BYTES).await else {
        return bad_request("unable to read request body");
    };

    let id_token = url::form_urlencoded::parse(body.as_ref())
        .find(|(key, _)| key == "id_token")
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty());
    let Some(id_token) = id_token else {
        return bad_request("no id_token provided in request");
    };

    if state.completed.load(Ordering::Acquire) {
        debug!("callback received after completion, ignoring");
        return confirmation();
    }

    let token_claims = match claims::extract(&id_token) {
        Ok(c) => c,
        Err(e) => {
            // Request-scoped failure: the attempt stays alive and the
            // response body leaks nothing about the decoder.
            warn!("{e}");
            return bad_request("unable to process token");
        }
    };

    if !state.session.validate(&token_claims) {
        let err = LoginError::NonceMismatch;
        let status = err.http_status();
        warn!("{err}");
        if !state.completed.swap(true, Ordering::AcqRel) {
            state.session.complete(CallbackOutcome::Rejected(err));
        }
        return respond(status, "Login attempt could not be trusted.");
    }

    if state.completed.swap(true, Ordering::AcqRel) {
        debug!("duplicate valid callback, ignoring");
        return confirmation();
    }

    // Persist before signalling: an invocation that observes "success" must
    // find the token if it reads the cache afterwards.
    let expires_at = token_claims.expires_at();
    if let Err(e) = state.cache.write(&state.environment, &id_token) {
        let status = e.http_status();
        error!("{e}");
        state.session.complete(CallbackOutcome::Rejected(e));
        return respond(status, "Failed storing token.");
    }

    info!(environment = %state.environment, expires_at = %expires_at, "ID token cached");
    state.session.complete(CallbackOutcome::Accepted { raw: id_token, expires_at });
    confirmation()
}

fn bad_request(message: &str) -> Response {
    let err = LoginError::MalformedRequest(message.to_owned());
    warn!("{err}");
    respond(err.http_status(), message)
}

fn respond(status: u16, body: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "text/plain")], body.to_owned()).into_response()
}

fn confirmation() -> Response {
    respond(200, CONFIRMATION_PAGE)
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
