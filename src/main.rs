mod config;
mod error;
mod github;
mod languages;
mod output;
mod pipeline;
mod source;
mod stats;
mod svg;

use anyhow::Context;
use config::Config;
use github::GithubClient;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;

    let client = GithubClient::new(config.token.clone()).context("failed to build HTTP client")?;
    if !client.is_authenticated() {
        info!("TOKEN not set; only public repositories are visible and rate limits are lower");
    }

    let written = pipeline::run(&client, &config).await.inspect_err(|e| {
        if e.is_auth_or_rate_limit() {
            error!("GitHub refused the request; check TOKEN or wait for the rate limit to reset");
        }
    })?;

    info!(
        languages = %written.languages.display(),
        stats = %written.stats.display(),
        "generated cards"
    );

    Ok(())
}
