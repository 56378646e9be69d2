// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{TimeZone, Utc};
use serde_json::json;

use super::*;
use crate::test_support::{encode_token, identity_token};

#[test]
fn decodes_nonce_expiry_subject_and_groups() {
    let token = identity_token("AbCd12XyZ789", 1_900_000_000);
    let claims = extract(&token).expect("should decode");

    assert_eq!(claims.nonce.as_deref(), Some("AbCd12XyZ789"));
    assert_eq!(claims.subject.as_deref(), Some("jane.doe@example.net"));
    assert_eq!(claims.groups(), ["TEAM-Platform", "k8s-users"]);
    assert_eq!(
        claims.expires_at(),
        Utc.timestamp_opt(1_900_000_000, 0).single().expect("valid timestamp")
    );
}

#[test]
fn missing_groups_decode_to_empty() {
    let token = encode_token(&json!({"nonce": "n", "exp": 1_900_000_000}));
    let claims = extract(&token).expect("should decode");
    assert!(claims.groups().is_empty());
}

#[test]
fn null_groups_decode_to_empty() {
    let token = encode_token(&json!({"nonce": "n", "exp": 1_900_000_000, "groups": null}));
    let claims = extract(&token).expect("should decode");
    assert!(claims.groups().is_empty());
}

#[test]
fn missing_expiry_is_trivially_expired() {
    let token = encode_token(&json!({"nonce": "n"}));
    let claims = extract(&token).expect("should decode");
    assert_eq!(claims.exp, 0);
    assert!(claims.is_expired(Utc::now()));
}

#[test]
fn future_expiry_is_not_expired() {
    let token = identity_token("n", Utc::now().timestamp() + 3600);
    let claims = extract(&token).expect("should decode");
    assert!(!claims.is_expired(Utc::now()));
}

#[test]
fn past_expiry_is_expired() {
    let token = identity_token("n", Utc::now().timestamp() - 3600);
    let claims = extract(&token).expect("should decode");
    assert!(claims.is_expired(Utc::now()));
}

#[test]
fn rejects_wrong_segment_count() {
    for raw in ["", "only-one", "two.segments", "a.b.c.d"] {
        let err = extract(raw).expect_err("should fail");
        assert!(matches!(err, LoginError::MalformedToken(_)), "{raw:?}: {err}");
    }
}

#[test]
fn rejects_payload_that_is_not_base64url() {
    let err = extract("header.!!!.signature").expect_err("should fail");
    assert!(matches!(err, LoginError::MalformedToken(_)));
}

#[test]
fn rejects_payload_that_is_not_a_claims_object() {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    let payload = URL_SAFE_NO_PAD.encode(b"[1,2,3]");
    let err = extract(&format!("header.{payload}.signature")).expect_err("should fail");
    assert!(matches!(err, LoginError::MalformedToken(_)));
}
