// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: ID-token builders.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::json;

/// Assemble a compact JWT around `payload`. The signature segment is filler:
/// nothing in this tool verifies it.
pub fn encode_token(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
    format!("{header}.{claims}.signature")
}

/// A plausible ID token for `nonce` expiring at `expires_at` (Unix seconds).
pub fn identity_token(nonce: &str, expires_at: i64) -> String {
    encode_token(&json!({
        "nonce": nonce,
        "exp": expires_at,
        "email": "jane.doe@example.net",
        "groups": ["TEAM-Platform", "k8s-users"],
    }))
}
