// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-environment store for the most recently fetched raw ID token.
//!
//! One file per environment under a single root directory, holding the raw
//! token with no framing. A missing file means "never logged in" and is a
//! normal state, not an error.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::LoginError;

#[derive(Debug, Clone)]
pub struct TokenCache {
    root: PathBuf,
}

impl TokenCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default cache root: `~/.kube/kubectl-login`.
    pub fn default_root() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".kube").join("kubectl-login")
    }

    pub fn token_path(&self, environment: &str) -> PathBuf {
        self.root.join(format!("{environment}.token"))
    }

    /// Read the cached token for an environment. A missing or empty file is
    /// `Ok(None)`.
    pub fn read(&self, environment: &str) -> Result<Option<String>, LoginError> {
        let path = self.token_path(environment);
        match fs::read_to_string(&path) {
            Ok(raw) => {
                let raw = raw.trim().to_owned();
                if raw.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(raw))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LoginError::CacheIo { path, source }),
        }
    }

    /// Write the token for an environment, replacing any previous one.
    ///
    /// The write goes to a temp file in the same directory followed by a
    /// rename, so concurrent invocations never observe a partial token.
    pub fn write(&self, environment: &str, raw: &str) -> Result<(), LoginError> {
        let path = self.token_path(environment);
        let io_err = |source| LoginError::CacheIo { path: path.clone(), source };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, raw).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;

        debug!(path = %path.display(), "token cached");
        Ok(())
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
