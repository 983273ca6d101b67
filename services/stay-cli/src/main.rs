//! campus-stay command-line client
//!
//! Runs one marketplace command per invocation against the configured
//! backend. The signed-in session persists in a JSON file between runs.

mod cli;
mod commands;
mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use api_client::ApiClient;
use clap::Parser;
use session::{FileTokenStore, Location};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr; stdout carries command output
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config_path = Config::resolve_path(cli.config.as_deref());
    debug!(path = %config_path.display(), "loading configuration");
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let store = FileTokenStore::load(config.session.path.clone()).with_context(|| {
        format!(
            "failed to read session from {}",
            config.session.path.display()
        )
    })?;

    let route = cli.command.route();
    let location = Arc::new(Location::new(route));
    let client = ApiClient::builder()
        .base_url(&config.api.base_url)
        .timeout(config.api.timeout())
        .token_store(Arc::new(store))
        .navigator(location.clone())
        .build()
        .context("failed to build API client")?;

    info!(
        base_url = %client.base_url(),
        route,
        session = %config.session.path.display(),
        "running command"
    );

    let result = commands::run(&client, cli.command).await;

    if commands::session_ended(route, location.as_ref()) {
        eprintln!("Your session has expired. Sign in again with: campus-stay login <email> <password>");
    }

    match result {
        Ok(output) => {
            let rendered = serde_json::to_string_pretty(&output).context("failed to render output")?;
            println!("{rendered}");
            Ok(())
        }
        Err(e) => anyhow::bail!("{}", e.user_message()),
    }
}
