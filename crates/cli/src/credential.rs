// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ExecCredential output for kubectl's exec credential protocol.
//!
//! When run as a credential plugin (`--print`) the object below is the only
//! thing written to stdout; kubectl parses it and extracts the token.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const API_VERSION: &str = "client.authentication.k8s.io/v1beta1";
pub const KIND: &str = "ExecCredential";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCredential {
    pub api_version: String,
    pub kind: String,
    pub status: ExecCredentialStatus,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCredentialStatus {
    pub token: String,
    pub expiration_timestamp: String,
}

/// Render the ExecCredential object for a raw token and its expiry.
pub fn format(raw: &str, expires_at: DateTime<Utc>) -> String {
    let credential = ExecCredential {
        api_version: API_VERSION.to_owned(),
        kind: KIND.to_owned(),
        status: ExecCredentialStatus {
            token: raw.to_owned(),
            expiration_timestamp: expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        },
    };
    serde_json::to_string_pretty(&credential).unwrap_or_default()
}

/// Print the ExecCredential object to stdout.
pub fn emit(raw: &str, expires_at: DateTime<Utc>) {
    println!("{}", format(raw, expires_at));
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
