// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Everything that can go wrong between "login needed" and "token cached".
///
/// The first two variants are request-scoped: the callback listener answers
/// them with an HTTP error and keeps serving. The rest end the login attempt.
#[derive(Debug)]
pub enum LoginError {
    /// Callback request malformed at the HTTP layer (method, headers, body).
    MalformedRequest(String),
    /// Bearer token could not be decoded into the expected claims shape.
    MalformedToken(String),
    /// Callback token echoed a nonce from a different authorization request.
    NonceMismatch,
    /// Issuer host did not resolve; reported before any browser is opened.
    NetworkUnreachable { host: String },
    /// Token store read or write failure.
    CacheIo { path: PathBuf, source: std::io::Error },
    /// No callback arrived within the wait window.
    IdleTimeout { after: Duration },
}

impl LoginError {
    /// HTTP status the callback listener answers with for this condition.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::MalformedRequest(_) => 400,
            Self::MalformedToken(_) => 400,
            Self::NonceMismatch => 400,
            Self::NetworkUnreachable { .. } => 502,
            Self::CacheIo { .. } => 500,
            Self::IdleTimeout { .. } => 504,
        }
    }

    /// Whether this condition must end the whole login attempt.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MalformedRequest(_) | Self::MalformedToken(_))
    }
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRequest(msg) => write!(f, "{msg}"),
            Self::MalformedToken(msg) => write!(f, "failed decoding token claims: {msg}"),
            Self::NonceMismatch => {
                write!(f, "nonce in ID token not identical to that in authorization request")
            }
            Self::NetworkUnreachable { host } => {
                write!(f, "could not resolve {host} - are you on the office network / VPN?")
            }
            Self::CacheIo { path, source } => {
                write!(f, "token cache {}: {source}", path.display())
            }
            Self::IdleTimeout { after } => {
                write!(f, "no authentication callback received within {}s", after.as_secs())
            }
        }
    }
}

impl std::error::Error for LoginError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CacheIo { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
