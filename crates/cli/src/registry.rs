// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable environment registry.
//!
//! Binds each logical environment (dev/qa/stage/prod) to its kubeconfig
//! context name and the issuer's authorize endpoint. Constructed once at
//! startup, either from the built-in table or from a TOML override file, and
//! passed explicitly to whoever needs it.

use std::fs;
use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentSpec {
    /// Logical name, e.g. "dev".
    pub name: String,
    /// Kubeconfig context this environment authenticates.
    pub context: String,
    /// Authorization endpoint of the environment's identity provider.
    pub authorize_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(rename = "environment", default)]
    environments: Vec<EnvironmentSpec>,
}

#[derive(Debug, Clone)]
pub struct ClusterRegistry {
    environments: Vec<EnvironmentSpec>,
}

impl ClusterRegistry {
    /// The built-in environment table.
    pub fn builtin() -> Self {
        let entry = |name: &str, context: &str, authorize_endpoint: &str| EnvironmentSpec {
            name: name.to_owned(),
            context: context.to_owned(),
            authorize_endpoint: authorize_endpoint.to_owned(),
        };
        Self {
            environments: vec![
                entry("dev", "k8s.dev.example.net", "https://login-dev.example.net/oauth2/authorize"),
                entry("qa", "k8s.qa.example.net", "https://login-qa.example.net/oauth2/authorize"),
                entry(
                    "stage",
                    "k8s.stage.example.net",
                    "https://login-stage.example.net/oauth2/authorize",
                ),
                entry("prod", "k8s.prod.example.net", "https://login.example.net/oauth2/authorize"),
            ],
        }
    }

    /// Build the registry: built-in table, or the TOML file at `path`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::builtin());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed reading registry file {}", path.display()))?;
        let file: RegistryFile = toml::from_str(&text)
            .with_context(|| format!("failed parsing registry file {}", path.display()))?;
        if file.environments.is_empty() {
            anyhow::bail!("registry file {} defines no environments", path.display());
        }
        Ok(Self { environments: file.environments })
    }

    pub fn environments(&self) -> &[EnvironmentSpec] {
        &self.environments
    }

    pub fn by_name(&self, name: &str) -> Option<&EnvironmentSpec> {
        self.environments.iter().find(|e| e.name == name)
    }

    /// Environment owning a kubeconfig context. Unknown contexts fall back
    /// to the first environment, with a warning.
    pub fn for_context(&self, context: &str) -> &EnvironmentSpec {
        if let Some(spec) = self.environments.iter().find(|e| e.context == context) {
            return spec;
        }
        let fallback = &self.environments[0];
        warn!(
            context,
            fallback = %fallback.name,
            "context not in registry, defaulting"
        );
        fallback
    }

    /// Known environment names, for diagnostics.
    pub fn names(&self) -> Vec<&str> {
        self.environments.iter().map(|e| e.name.as_str()).collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
