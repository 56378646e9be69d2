// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;
use tempfile::TempDir;
use tokio::sync::mpsc;

use super::*;
use crate::test_support::identity_token;

const NONCE: &str = "AbCd12XyZ789";

struct TestListener {
    handle: ListenerHandle,
    outcome_rx: mpsc::Receiver<CallbackOutcome>,
    cache: TokenCache,
    _dir: TempDir,
}

impl TestListener {
    fn redirect_url(&self) -> String {
        format!("http://{}{}", self.handle.addr(), REDIRECT_PATH)
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.handle.addr(), path)
    }
}

async fn start_listener() -> TestListener {
    let dir = TempDir::new().expect("tempdir");
    let cache = TokenCache::new(dir.path());
    let (session, outcome_rx) = Session::with_nonce(NONCE);
    let state = Arc::new(CallbackState::new(session, cache.clone(), "dev"));
    let handle = spawn("127.0.0.1:0".parse().expect("addr"), state).await.expect("spawn listener");
    TestListener { handle, outcome_rx, cache, _dir: dir }
}

fn fresh_token() -> String {
    identity_token(NONCE, Utc::now().timestamp() + 3600)
}

async fn post_token(url: &str, token: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(url)
        .form(&[("id_token", token)])
        .send()
        .await
        .expect("send callback")
}

#[tokio::test]
async fn valid_callback_caches_token_and_signals_completion() {
    let mut listener = start_listener().await;
    let token = fresh_token();

    let resp = post_token(&listener.redirect_url(), &token).await;
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.expect("body");
    assert!(body.contains("close this browser tab"), "{body}");

    assert_eq!(listener.cache.read("dev").expect("read").as_deref(), Some(token.as_str()));
    match listener.outcome_rx.try_recv().expect("one outcome") {
        CallbackOutcome::Accepted { raw, expires_at } => {
            assert_eq!(raw, token);
            assert!(expires_at > Utc::now());
        }
        other => panic!("expected Accepted, got {other:?}"),
    }

    listener.handle.shutdown().await;
}

#[tokio::test]
async fn nonce_mismatch_rejects_and_leaves_cache_untouched() {
    let mut listener = start_listener().await;
    let token = identity_token("WRONG", Utc::now().timestamp() + 3600);

    let resp = post_token(&listener.redirect_url(), &token).await;
    assert_eq!(resp.status(), 400);
    let body = resp.text().await.expect("body");
    assert!(body.contains("could not be trusted"), "{body}");

    assert!(listener.cache.read("dev").expect("read").is_none(), "cache must stay empty");
    match listener.outcome_rx.try_recv().expect("one outcome") {
        CallbackOutcome::Rejected(LoginError::NonceMismatch) => {}
        other => panic!("expected Rejected(NonceMismatch), got {other:?}"),
    }

    listener.handle.shutdown().await;
}

#[tokio::test]
async fn get_yields_method_not_allowed_with_empty_body() {
    let mut listener = start_listener().await;

    let resp = reqwest::Client::new()
        .get(listener.redirect_url())
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 405);
    assert_eq!(resp.text().await.expect("body"), "");

    assert!(listener.outcome_rx.try_recv().is_err());
    listener.handle.shutdown().await;
}

#[tokio::test]
async fn wrong_content_type_is_bad_request() {
    let mut listener = start_listener().await;

    let resp = reqwest::Client::new()
        .post(listener.redirect_url())
        .header("Content-Type", "text/plain")
        .body(format!("id_token={}", fresh_token()))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 400);

    assert!(listener.outcome_rx.try_recv().is_err());
    assert!(listener.cache.read("dev").expect("read").is_none());
    listener.handle.shutdown().await;
}

#[tokio::test]
async fn missing_id_token_field_is_bad_request() {
    let mut listener = start_listener().await;

    let resp = reqwest::Client::new()
        .post(listener.redirect_url())
        .form(&[("access_token", "nope")])
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 400);
    let body = resp.text().await.expect("body");
    assert!(body.contains("id_token"), "{body}");

    assert!(listener.outcome_rx.try_recv().is_err());
    listener.handle.shutdown().await;
}

#[tokio::test]
async fn posts_to_unrelated_paths_are_ignored() {
    let mut listener = start_listener().await;

    let resp = post_token(&listener.url("/favicon.ico"), &fresh_token()).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), "");

    assert!(listener.outcome_rx.try_recv().is_err());
    assert!(listener.cache.read("dev").expect("read").is_none());
    listener.handle.shutdown().await;
}

#[tokio::test]
async fn undecodable_token_keeps_the_listener_serving() {
    let mut listener = start_listener().await;

    let resp = post_token(&listener.redirect_url(), "not-a-jwt").await;
    assert_eq!(resp.status(), 400);
    assert!(listener.outcome_rx.try_recv().is_err(), "decode failure must not complete");

    // The attempt is still alive: a trustworthy callback completes it.
    let token = fresh_token();
    let resp = post_token(&listener.redirect_url(), &token).await;
    assert_eq!(resp.status(), 200);
    assert!(matches!(
        listener.outcome_rx.try_recv(),
        Ok(CallbackOutcome::Accepted { .. })
    ));

    listener.handle.shutdown().await;
}

#[tokio::test]
async fn duplicate_callback_is_processed_once() {
    let mut listener = start_listener().await;
    let token = fresh_token();

    let first = post_token(&listener.redirect_url(), &token).await;
    assert_eq!(first.status(), 200);
    let second = post_token(&listener.redirect_url(), &token).await;
    assert_eq!(second.status(), 200);

    assert!(matches!(
        listener.outcome_rx.try_recv(),
        Ok(CallbackOutcome::Accepted { .. })
    ));
    assert!(listener.outcome_rx.try_recv().is_err(), "completion must be signalled once");
    assert_eq!(listener.cache.read("dev").expect("read").as_deref(), Some(token.as_str()));

    listener.handle.shutdown().await;
}

#[tokio::test]
async fn callbacks_after_a_rejection_are_ignored() {
    let mut listener = start_listener().await;

    let forged = identity_token("WRONG", Utc::now().timestamp() + 3600);
    let resp = post_token(&listener.redirect_url(), &forged).await;
    assert_eq!(resp.status(), 400);

    // Attempt already concluded as untrusted; even a valid token changes nothing.
    let resp = post_token(&listener.redirect_url(), &fresh_token()).await;
    assert_eq!(resp.status(), 200);

    assert!(matches!(
        listener.outcome_rx.try_recv(),
        Ok(CallbackOutcome::Rejected(LoginError::NonceMismatch))
    ));
    assert!(listener.outcome_rx.try_recv().is_err());
    assert!(listener.cache.read("dev").expect("read").is_none());

    listener.handle.shutdown().await;
}

#[tokio::test]
async fn shutdown_stops_accepting_connections() {
    let listener = start_listener().await;
    let url = listener.redirect_url();

    listener.handle.shutdown().await;

    let result = reqwest::Client::new().post(&url).form(&[("id_token", "x")]).send().await;
    assert!(result.is_err(), "listener should be gone after shutdown");
}
