// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal kubeconfig handling: `--init` bootstrap files and current-context
//! resolution. Only the fields this tool reads or writes are modelled;
//! everything else in a user's kubeconfig is ignored on read.

use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::credential;
use crate::registry::{ClusterRegistry, EnvironmentSpec};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct KubeConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    #[serde(default)]
    pub users: Vec<NamedUser>,
    #[serde(rename = "current-context", default, skip_serializing_if = "Option::is_none")]
    pub current_context: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: Cluster,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Cluster {
    pub server: String,
    #[serde(rename = "insecure-skip-tls-verify", default)]
    pub insecure_skip_tls_verify: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextSpec,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContextSpec {
    pub cluster: String,
    pub user: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: User,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// `~/.kube/config`.
pub fn recommended_path() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".kube").join("config")
}

/// The kubeconfig search list: `$KUBECONFIG` entries, else the default path.
pub fn config_paths() -> Vec<PathBuf> {
    match std::env::var("KUBECONFIG") {
        Ok(list) if !list.trim().is_empty() => {
            list.split(':').filter(|p| !p.is_empty()).map(PathBuf::from).collect()
        }
        _ => vec![recommended_path()],
    }
}

/// First current-context named by the kubeconfig search list.
pub fn current_context() -> anyhow::Result<Option<String>> {
    current_context_from(&config_paths())
}

pub fn current_context_from(paths: &[PathBuf]) -> anyhow::Result<Option<String>> {
    for path in paths {
        if !path.exists() {
            continue;
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed reading kubeconfig {}", path.display()))?;
        let config: KubeConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("failed parsing kubeconfig {}", path.display()))?;
        if let Some(context) = config.current_context.filter(|c| !c.is_empty()) {
            return Ok(Some(context));
        }
    }
    Ok(None)
}

/// A clean kubeconfig for one environment: cluster, context, and a user that
/// gets its credential from this tool in exec mode.
pub fn bootstrap_config(spec: &EnvironmentSpec, set_current: bool) -> KubeConfig {
    let context = spec.context.clone();
    KubeConfig {
        api_version: "v1".to_owned(),
        kind: "Config".to_owned(),
        clusters: vec![NamedCluster {
            name: context.clone(),
            cluster: Cluster {
                server: format!("https://api.{context}"),
                insecure_skip_tls_verify: true,
            },
        }],
        contexts: vec![NamedContext {
            name: context.clone(),
            context: ContextSpec { cluster: context.clone(), user: context.clone() },
        }],
        users: vec![NamedUser {
            name: context.clone(),
            user: User {
                exec: Some(ExecConfig {
                    api_version: credential::API_VERSION.to_owned(),
                    command: "kubectl-login".to_owned(),
                    args: vec!["--print".to_owned()],
                }),
            },
        }],
        current_context: set_current.then_some(context),
    }
}

/// Write the bootstrap kubeconfig for one environment next to the default
/// kubeconfig, suffixed with the environment name.
pub fn init_environment(spec: &EnvironmentSpec, set_current: bool) -> anyhow::Result<PathBuf> {
    let path = PathBuf::from(format!("{}.{}", recommended_path().display(), spec.name));
    write_config(&bootstrap_config(spec, set_current), &path)?;
    Ok(path)
}

pub fn write_config(config: &KubeConfig, path: &std::path::Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating {}", parent.display()))?;
    }
    let yaml = serde_yaml::to_string(config).context("failed serializing kubeconfig")?;
    fs::write(path, yaml).with_context(|| format!("failed writing config to {}", path.display()))
}

/// Run `--init`. Returns the process exit code.
pub fn run_init(registry: &ClusterRegistry, environment: &str) -> anyhow::Result<i32> {
    if environment == "all" {
        let mut first = true;
        for spec in registry.environments() {
            let path = init_environment(spec, first)?;
            first = false;
            println!("Stored initial {} configuration in {}", spec.name, path.display());
        }
        return Ok(0);
    }

    let Some(spec) = registry.by_name(environment) else {
        anyhow::bail!(
            "unknown environment {environment:?} (expected {} or \"all\")",
            registry.names().join("|")
        );
    };
    let path = init_environment(spec, true)?;
    println!("Stored initial {} configuration in {}", spec.name, path.display());
    Ok(0)
}

#[cfg(test)]
#[path = "kubeconfig_tests.rs"]
mod tests;
