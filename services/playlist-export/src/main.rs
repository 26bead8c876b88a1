//! YouTube Playlist Export
//!
//! Single-binary tool that:
//! 1. Obtains a read-only YouTube access token (stored, refreshed or via browser)
//! 2. Reads the playlist id from `--playlist-id` or an interactive prompt
//! 3. Walks every page of the playlist and merges in its metadata
//! 4. Writes the result to `<output dir>/<title> - <timestamp>.json`

mod config;
mod export;
mod prompt;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use youtube_api::{ApiClient, index_playlist};
use youtube_auth::{Authenticator, ClientRegistration, CredentialStore, SystemBrowser};

use crate::config::Config;

/// Export a private YouTube playlist to JSON
#[derive(Debug, Parser)]
#[command(name = "playlist-export", version, about)]
struct Args {
    /// Path to the TOML config file (default: $CONFIG_PATH or playlist-export.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Playlist to export; prompted for when omitted
    #[arg(long, value_name = "ID")]
    playlist_id: Option<String>,
}

/// Human-readable logs on stderr, JSON lines with `LOG_FORMAT=json`.
/// Filter from LOG_LEVEL, then RUST_LOG, default "info".
fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(path) => {
            info!(path = %path.display(), "export complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let message = format!("{e:#}");
            error!(error = %message, "export failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<PathBuf> {
    let source = Config::resolve_path(args.config.as_deref());
    info!(path = %source.path().display(), "loading configuration");

    let config = Config::load(&source)
        .with_context(|| format!("failed to load config from {}", source.path().display()))?;

    info!(
        client_file = %config.auth.client_file.display(),
        token_file = %config.auth.token_file.display(),
        base_url = %config.api.base_url,
        page_size = config.api.page_size,
        output_dir = %config.output.dir.display(),
        "configuration loaded"
    );

    let registration = ClientRegistration::load(&config.auth.client_file)
        .await
        .with_context(|| {
            format!(
                "failed to load client registration from {}",
                config.auth.client_file.display()
            )
        })?;

    let http = reqwest::Client::new();

    info!("starting authorization");
    let authenticator = Authenticator::new(
        http.clone(),
        registration,
        CredentialStore::new(config.auth.token_file.clone()),
        SystemBrowser,
    );
    let access_token = authenticator
        .access_token()
        .await
        .context("failed to obtain an access token")?;

    let playlist_id = match args.playlist_id {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        Some(_) => anyhow::bail!("--playlist-id must not be empty"),
        None => {
            prompt::read_playlist_id(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
                .await?
        }
    };

    let api = ApiClient::new(http, config.api.base_url.clone(), access_token, config.api.page_size);
    let playlist = match index_playlist(&api, &playlist_id).await {
        Ok(playlist) => playlist,
        Err(e) => {
            if let youtube_api::Error::Api(payload) = &e {
                let body = serde_json::to_string(payload).unwrap_or_default();
                error!(payload = %body, "YouTube API returned an error, nothing was written");
            }
            return Err(e).with_context(|| format!("failed to export playlist {playlist_id}"));
        }
    };

    export::write_playlist(&config.output.dir, &playlist, Utc::now())
        .await
        .context("failed to write playlist export")
}
