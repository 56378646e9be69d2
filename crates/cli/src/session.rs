// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One login attempt: a single-use nonce and its completion channel.

use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use tokio::sync::mpsc;

use crate::claims::Claims;
use crate::error::LoginError;

/// Length of the nonce embedded in the authorization request.
pub const NONCE_LENGTH: usize = 12;

/// What the callback listener reports back to the orchestrator.
///
/// Exactly one outcome is delivered per attempt.
#[derive(Debug)]
pub enum CallbackOutcome {
    /// A trusted token was received and persisted.
    Accepted { raw: String, expires_at: DateTime<Utc> },
    /// The attempt must abort (nonce mismatch, cache failure).
    Rejected(LoginError),
}

/// State binding one authorization request to the callback that answers it.
#[derive(Debug)]
pub struct Session {
    nonce: String,
    outcome_tx: mpsc::Sender<CallbackOutcome>,
}

impl Session {
    /// Create a session with a fresh random nonce, returning the receiving
    /// half of its completion channel.
    pub fn new() -> (Self, mpsc::Receiver<CallbackOutcome>) {
        let nonce: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LENGTH)
            .map(char::from)
            .collect();
        Self::with_nonce(nonce)
    }

    /// Create a session with a caller-provided nonce.
    pub fn with_nonce(nonce: impl Into<String>) -> (Self, mpsc::Receiver<CallbackOutcome>) {
        let (outcome_tx, outcome_rx) = mpsc::channel(1);
        (Self { nonce: nonce.into(), outcome_tx }, outcome_rx)
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// True iff the token's echoed nonce matches this session's nonce.
    pub fn validate(&self, claims: &Claims) -> bool {
        claims.nonce.as_deref() == Some(self.nonce.as_str())
    }

    /// Deliver the attempt's outcome. The channel holds one message and the
    /// caller guards against double completion, so this never blocks.
    pub fn complete(&self, outcome: CallbackOutcome) {
        let _ = self.outcome_tx.try_send(outcome);
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
