// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use kubectl_login::cache::TokenCache;
use kubectl_login::config::Config;
use kubectl_login::kubeconfig;
use kubectl_login::login;
use kubectl_login::registry::ClusterRegistry;
use kubectl_login::whoami;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    init_tracing(&config);

    match run(config).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("fatal: {e:#}");
            std::process::exit(1);
        }
    }
}

// Diagnostics go to stderr: in --print mode stdout carries nothing but the
// ExecCredential object.
fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    match config.log_format.as_str() {
        "json" => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();
        }
        _ => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
    }
}

async fn run(config: Config) -> anyhow::Result<i32> {
    if let Some(ref environment) = config.init {
        let registry = ClusterRegistry::load(config.registry.as_deref())?;
        return kubeconfig::run_init(&registry, environment);
    }

    if config.whoami {
        let registry = ClusterRegistry::load(config.registry.as_deref())?;
        let cache = TokenCache::new(config.cache_root());
        let environment = login::current_environment(&registry)?;
        let raw = cache.read(&environment.name)?;
        println!("{}", whoami::report(raw.as_deref())?);
        return Ok(0);
    }

    login::run(&config).await
}
