//! Configuration types and loading
//!
//! Config precedence: env vars > config file > defaults.
//! Every key has a default, so the tool runs without a config file as long
//! as `client.json` sits in the working directory.

use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "playlist-export.toml";

/// Serializes tests that read or mutate environment variables, preventing
/// data races when tests run in parallel.
#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Where the config file path came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config` or `CONFIG_PATH`: the file must exist
    Explicit(PathBuf),
    /// Fallback path: a missing file means built-in defaults
    Default(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::Explicit(path) | ConfigSource::Default(path) => path,
        }
    }
}

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// OAuth client registration and token storage
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_client_file")]
    pub client_file: PathBuf,
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
}

/// YouTube Data API settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u8,
}

/// Export destination
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_client_file() -> PathBuf {
    PathBuf::from("client.json")
}

fn default_token_file() -> PathBuf {
    PathBuf::from("tokens.json")
}

fn default_base_url() -> String {
    "https://youtube.googleapis.com/youtube/v3".to_string()
}

fn default_page_size() -> u8 {
    50
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("result")
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_file: default_client_file(),
            token_file: default_token_file(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// `YOUTUBE_API_BASE_URL` overrides `api.base_url`.
    pub fn load(source: &ConfigSource) -> common::Result<Self> {
        let contents = match std::fs::read_to_string(source.path()) {
            Ok(contents) => contents,
            Err(e)
                if e.kind() == std::io::ErrorKind::NotFound
                    && matches!(source, ConfigSource::Default(_)) =>
            {
                tracing::debug!(path = %source.path().display(), "no config file, using defaults");
                String::new()
            }
            Err(e) => return Err(e.into()),
        };
        let mut config: Config = toml::from_str(&contents)?;

        if let Ok(url) = std::env::var("YOUTUBE_API_BASE_URL") {
            config.api.base_url = url;
        }

        // Validate base_url is a valid URL with http(s) scheme
        if !config.api.base_url.starts_with("http://")
            && !config.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                config.api.base_url
            )));
        }

        if !(1..=50).contains(&config.api.page_size) {
            return Err(common::Error::Config(format!(
                "page_size must be between 1 and 50, got: {}",
                config.api.page_size
            )));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&Path>) -> ConfigSource {
        if let Some(p) = cli_path {
            return ConfigSource::Explicit(p.to_path_buf());
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return ConfigSource::Explicit(PathBuf::from(p));
        }
        ConfigSource::Default(PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}
