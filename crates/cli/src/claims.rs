// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unverified ID-token claim extraction.
//!
//! The payload segment of the compact JWT is base64url-decoded and
//! deserialized without any signature check. All verification is done server
//! side by the Kubernetes API, so the decoded values are only trustworthy for
//! display and expiry checks. Never base an authorization decision on them.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::error::LoginError;

/// Claims carried by an ID token that this tool cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// Nonce echoed from the authorization request.
    #[serde(default)]
    pub nonce: Option<String>,
    /// Expiry as seconds since the Unix epoch. Absent decodes to 0, which
    /// makes the token trivially expired.
    #[serde(default)]
    pub exp: i64,
    /// Authenticated identity (the provider puts it in the `email` claim).
    #[serde(default, rename = "email")]
    pub subject: Option<String>,
    #[serde(default)]
    groups: Option<Vec<String>>,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at() <= now
    }

    /// Group memberships; a token without a groups claim has none.
    pub fn groups(&self) -> &[String] {
        self.groups.as_deref().unwrap_or(&[])
    }
}

/// Decode the claims of a compact JWT without verifying its signature.
pub fn extract(raw: &str) -> Result<Claims, LoginError> {
    let mut segments = raw.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            return Err(LoginError::MalformedToken(
                "expected three dot-separated segments".to_owned(),
            ))
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| LoginError::MalformedToken(format!("payload is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| LoginError::MalformedToken(format!("payload is not a claims object: {e}")))
}

#[cfg(test)]
#[path = "claims_tests.rs"]
mod tests;
