// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::Parser;

use crate::cache::TokenCache;

/// Browser-based OIDC login for kubectl.
#[derive(Debug, Parser)]
#[command(name = "kubectl-login", version, about)]
pub struct Config {
    /// Force re-authentication even if a valid token is present in the cache.
    #[arg(long)]
    pub force: bool,

    /// Print an ExecCredential object to stdout (exec credential plugin mode).
    #[arg(long)]
    pub print: bool,

    /// Initialize kubeconfig for the provided environment, or "all".
    #[arg(long, value_name = "ENV")]
    pub init: Option<String>,

    /// Show the identity and group memberships from the cached token.
    #[arg(long)]
    pub whoami: bool,

    /// TOML file replacing the built-in environment registry.
    #[arg(long, env = "KUBECTL_LOGIN_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Directory where fetched ID tokens are cached.
    #[arg(long, env = "KUBECTL_LOGIN_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Seconds to wait for the browser callback before giving up.
    #[arg(long, env = "KUBECTL_LOGIN_IDLE_TIMEOUT", default_value = "600")]
    pub idle_timeout: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "KUBECTL_LOGIN_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Log format (json or text).
    #[arg(long, env = "KUBECTL_LOGIN_LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.init.is_some() && self.whoami {
            anyhow::bail!("--init and --whoami are mutually exclusive");
        }
        if self.idle_timeout == 0 {
            anyhow::bail!("--idle-timeout must be positive");
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        Ok(())
    }

    pub fn cache_root(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(TokenCache::default_root)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
