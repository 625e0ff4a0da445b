use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::importer::ImportOptions;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Raw request headers copied from a logged-in browser session.
    pub headers_raw_file: PathBuf,
    #[serde(default = "default_auth_generated_file")]
    pub auth_generated_file: PathBuf,
    #[serde(default = "default_api_delay")]
    pub api_delay_seconds: f64,
    #[serde(default = "default_max_retries")]
    pub api_max_retries: u32,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_page_limit")]
    pub library_playlist_limit: usize,
    #[serde(default = "default_page_limit")]
    pub playlist_item_limit: usize,
}

fn default_auth_generated_file() -> PathBuf { "./browser.json".into() }
fn default_api_delay() -> f64 { 1.0 }
fn default_max_retries() -> u32 { 3 }
fn default_log_dir() -> PathBuf { ".".into() }
fn default_log_level() -> String { "INFO".into() }
fn default_page_limit() -> usize { 1000 }

impl Config {
    pub fn from_path(path: &std::path::Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load `.env` from the working directory (when present) and read the
    /// process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        match dotenv::dotenv() {
            Ok(path) => log::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(anyhow!(e).context("loading .env file")),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from a key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let headers_raw_file = get("HEADERS_RAW_FILE")
            .ok_or_else(|| anyhow!("Missing required environment variable: HEADERS_RAW_FILE"))?;

        let cfg = Config {
            headers_raw_file: headers_raw_file.into(),
            auth_generated_file: get("AUTH_GENERATED_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(default_auth_generated_file),
            api_delay_seconds: parse_or(get("YT_API_DELAY_SECONDS"), "YT_API_DELAY_SECONDS", default_api_delay)?,
            api_max_retries: parse_or(get("YT_API_MAX_RETRIES"), "YT_API_MAX_RETRIES", default_max_retries)?,
            log_dir: get("LOG_DIR").map(PathBuf::from).unwrap_or_else(default_log_dir),
            log_level: get("LOG_LEVEL").map(|l| l.to_uppercase()).unwrap_or_else(default_log_level),
            library_playlist_limit: parse_or(
                get("YT_LIBRARY_PLAYLIST_LIMIT"),
                "YT_LIBRARY_PLAYLIST_LIMIT",
                default_page_limit,
            )?,
            playlist_item_limit: parse_or(get("YT_PLAYLIST_ITEM_LIMIT"), "YT_PLAYLIST_ITEM_LIMIT", default_page_limit)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.api_delay_seconds.is_finite() || self.api_delay_seconds < 0.0 {
            bail!("api delay must be a non-negative number of seconds, got {}", self.api_delay_seconds);
        }
        if self.api_max_retries == 0 {
            bail!("api max retries must be at least 1");
        }
        Ok(())
    }

    /// `tracing` filter directive for the configured level. Python-style
    /// names (WARNING, CRITICAL) are accepted.
    pub fn log_filter(&self) -> String {
        match self.log_level.trim().to_uppercase().as_str() {
            "TRACE" => "trace",
            "DEBUG" => "debug",
            "WARN" | "WARNING" => "warn",
            "ERROR" | "CRITICAL" => "error",
            _ => "info",
        }
        .to_string()
    }

    pub fn api_delay(&self) -> Duration {
        Duration::from_secs_f64(self.api_delay_seconds)
    }

    pub fn import_options(&self, allow_duplicates: bool, delete_if_exists: bool) -> ImportOptions {
        ImportOptions {
            allow_duplicates,
            delete_if_exists,
            api_delay: self.api_delay(),
            api_max_retries: self.api_max_retries,
            library_playlist_limit: self.library_playlist_limit,
            playlist_item_limit: self.playlist_item_limit,
        }
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: fn() -> T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v.parse().with_context(|| format!("invalid value for {}: '{}'", key, v)),
        None => Ok(default()),
    }
}
