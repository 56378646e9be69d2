// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Login orchestration: cache check, authorization request, listener
//! lifecycle, and the multiplexed wait for an outcome.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::mpsc;
use tracing::{info, warn};
use url::Url;

use crate::browser;
use crate::cache::TokenCache;
use crate::config::Config;
use crate::credential;
use crate::error::LoginError;
use crate::kubeconfig;
use crate::listener::{self, CallbackState};
use crate::registry::{ClusterRegistry, EnvironmentSpec};
use crate::session::{CallbackOutcome, Session};

/// OAuth client identifier registered with the identity provider.
pub const CLIENT_ID: &str = "kubectl-login";
const SCOPE: &str = "profile openid";

/// Exit code for a user-aborted login (128 + SIGINT).
const EXIT_INTERRUPTED: i32 = 130;

/// Result of consulting the token cache before a login.
#[derive(Debug)]
pub enum CachedToken {
    Fresh { raw: String, expires_at: DateTime<Utc> },
    NeedsLogin,
}

/// How the multiplexed wait resolved.
#[derive(Debug)]
pub enum WaitResult {
    Outcome(CallbackOutcome),
    Interrupted,
    TimedOut,
}

/// Read the cache and decide whether a browser login is needed.
///
/// A cached token that no longer decodes is reported as corrupt rather than
/// silently treated as absent.
pub fn check_cached_token(
    cache: &TokenCache,
    environment: &str,
    force: bool,
) -> Result<CachedToken, LoginError> {
    let Some(raw) = cache.read(environment)? else {
        return Ok(CachedToken::NeedsLogin);
    };
    let token_claims = crate::claims::extract(&raw)?;
    if !force && !token_claims.is_expired(Utc::now()) {
        return Ok(CachedToken::Fresh { raw, expires_at: token_claims.expires_at() });
    }
    Ok(CachedToken::NeedsLogin)
}

/// Resolve the environment the current kubeconfig context points at.
pub fn current_environment(registry: &ClusterRegistry) -> anyhow::Result<&EnvironmentSpec> {
    let context = kubeconfig::current_context()?.ok_or_else(|| {
        anyhow::anyhow!("no current-context set - run 'kubectl-login --init <env>' to initialize one")
    })?;
    Ok(registry.for_context(&context))
}

/// Top-level login entry point. Returns the process exit code.
pub async fn run(config: &Config) -> anyhow::Result<i32> {
    let registry = ClusterRegistry::load(config.registry.as_deref())?;
    let cache = TokenCache::new(config.cache_root());
    let environment = current_environment(&registry)?;

    match check_cached_token(&cache, &environment.name, config.force)? {
        CachedToken::Fresh { raw, expires_at } => {
            if config.print {
                credential::emit(&raw, expires_at);
            } else {
                println!(
                    "Previously fetched ID token still valid. Use kubectl-login --force to force re-authentication."
                );
            }
            Ok(0)
        }
        CachedToken::NeedsLogin => perform_login(config, environment, cache).await,
    }
}

/// Run one browser login attempt against `environment`.
async fn perform_login(
    config: &Config,
    environment: &EnvironmentSpec,
    cache: TokenCache,
) -> anyhow::Result<i32> {
    let authorize = Url::parse(&environment.authorize_endpoint).with_context(|| {
        format!("invalid authorize endpoint {:?}", environment.authorize_endpoint)
    })?;
    ensure_resolvable(&authorize).await?;

    let (session, mut outcome_rx) = Session::new();
    let authorize_url = authorize_request_url(&authorize, session.nonce());

    // Bind before the browser is pointed anywhere near the redirect URI.
    let state = Arc::new(CallbackState::new(session, cache, environment.name.clone()));
    let addr: SocketAddr = ([127, 0, 0, 1], listener::REDIRECT_PORT).into();
    let handle = listener::spawn(addr, state)
        .await
        .with_context(|| format!("failed binding callback listener on {addr}"))?;

    if let Err(e) = browser::open_url(&authorize_url) {
        handle.shutdown().await;
        anyhow::bail!("failed opening browser: {e}\nOpen manually: {authorize_url}");
    }
    info!(environment = %environment.name, "waiting for browser authentication");

    let idle_timeout = Duration::from_secs(config.idle_timeout);
    let result = await_outcome(&mut outcome_rx, idle_timeout, interrupt_signal()).await;
    handle.shutdown().await;

    match result {
        WaitResult::Outcome(CallbackOutcome::Accepted { raw, expires_at }) => {
            if config.print {
                credential::emit(&raw, expires_at);
            } else {
                println!(
                    "Authenticated for context {}. Token valid until {}.",
                    environment.context,
                    expires_at.to_rfc3339_opts(SecondsFormat::Secs, true)
                );
            }
            Ok(0)
        }
        WaitResult::Outcome(CallbackOutcome::Rejected(err)) => Err(err.into()),
        WaitResult::Interrupted => {
            info!("login aborted by signal");
            Ok(EXIT_INTERRUPTED)
        }
        WaitResult::TimedOut => Err(LoginError::IdleTimeout { after: idle_timeout }.into()),
    }
}

/// Fail fast when the issuer host does not resolve, before a browser opens
/// against a dead endpoint.
async fn ensure_resolvable(authorize: &Url) -> Result<(), LoginError> {
    let host = authorize
        .host_str()
        .ok_or_else(|| LoginError::NetworkUnreachable { host: authorize.to_string() })?;
    let port = authorize.port_or_known_default().unwrap_or(443);
    tokio::net::lookup_host((host, port))
        .await
        .map_err(|_| LoginError::NetworkUnreachable { host: host.to_owned() })?;
    Ok(())
}

/// Authorization request for the implicit flow, bound to `nonce`.
fn authorize_request_url(authorize: &Url, nonce: &str) -> String {
    let mut url = authorize.clone();
    url.query_pairs_mut()
        .append_pair("redirect_uri", listener::REDIRECT_URI)
        .append_pair("client_id", CLIENT_ID)
        .append_pair("response_type", "id_token")
        .append_pair("response_mode", "form_post")
        .append_pair("scope", SCOPE)
        .append_pair("nonce", nonce);
    url.to_string()
}

/// Block on the three wakeup sources: callback outcome, interrupt, idle
/// timer. Resolves exactly once.
pub(crate) async fn await_outcome(
    outcome_rx: &mut mpsc::Receiver<CallbackOutcome>,
    idle_timeout: Duration,
    interrupt: impl Future<Output = ()>,
) -> WaitResult {
    tokio::select! {
        outcome = outcome_rx.recv() => match outcome {
            Some(outcome) => WaitResult::Outcome(outcome),
            None => {
                warn!("completion channel closed before any outcome");
                WaitResult::TimedOut
            }
        },
        () = interrupt => WaitResult::Interrupted,
        () = tokio::time::sleep(idle_timeout) => WaitResult::TimedOut,
    }
}

/// Resolves when the user asks the process to stop.
async fn interrupt_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).ok();
    let mut sigterm = signal(SignalKind::terminate()).ok();
    let mut sigquit = signal(SignalKind::quit()).ok();

    tokio::select! {
        _ = async {
            if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
        } => info!("received SIGINT"),
        _ = async {
            if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
        } => info!("received SIGTERM"),
        _ = async {
            if let Some(ref mut s) = sigquit { s.recv().await } else { std::future::pending().await }
        } => info!("received SIGQUIT"),
    }
}

#[cfg(test)]
#[path = "login_tests.rs"]
mod tests;
