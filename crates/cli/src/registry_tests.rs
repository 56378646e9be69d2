// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn builtin_covers_the_four_environments() {
    let registry = ClusterRegistry::builtin();
    assert_eq!(registry.names(), ["dev", "qa", "stage", "prod"]);

    let prod = registry.by_name("prod").expect("prod exists");
    assert_eq!(prod.context, "k8s.prod.example.net");
    assert!(prod.authorize_endpoint.starts_with("https://"));
}

#[test]
fn context_lookup_finds_its_environment() {
    let registry = ClusterRegistry::builtin();
    assert_eq!(registry.for_context("k8s.qa.example.net").name, "qa");
    assert_eq!(registry.for_context("k8s.stage.example.net").name, "stage");
}

#[test]
fn unknown_context_falls_back_to_the_first_environment() {
    let registry = ClusterRegistry::builtin();
    assert_eq!(registry.for_context("minikube").name, "dev");
}

#[test]
fn load_without_a_file_is_the_builtin_table() {
    let registry = ClusterRegistry::load(None).expect("builtin");
    assert_eq!(registry.environments().len(), 4);
}

#[test]
fn load_replaces_the_table_with_the_toml_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("registry.toml");
    std::fs::write(
        &path,
        r#"
[[environment]]
name = "lab"
context = "k8s.lab.example.net"
authorize_endpoint = "https://login-lab.example.net/oauth2/authorize"

[[environment]]
name = "prod"
context = "k8s.prod.example.net"
authorize_endpoint = "https://login.example.net/oauth2/authorize"
"#,
    )
    .expect("write registry");

    let registry = ClusterRegistry::load(Some(&path)).expect("load");
    assert_eq!(registry.names(), ["lab", "prod"]);
    assert_eq!(registry.for_context("k8s.lab.example.net").name, "lab");
    assert!(registry.by_name("dev").is_none());
}

#[test]
fn empty_registry_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("registry.toml");
    std::fs::write(&path, "# no environments\n").expect("write registry");
    assert!(ClusterRegistry::load(Some(&path)).is_err());
}

#[test]
fn missing_registry_file_is_an_error() {
    let path = std::path::Path::new("/nonexistent/registry.toml");
    assert!(ClusterRegistry::load(Some(path)).is_err());
}
