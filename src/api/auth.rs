use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Headers kept from the browser dump. Everything else (content-length,
/// request-specific fetch metadata, ...) is dropped.
const KEPT_HEADERS: &[&str] = &[
    "accept",
    "accept-language",
    "authorization",
    "cookie",
    "user-agent",
    "x-goog-authuser",
    "x-goog-visitor-id",
];

/// Browser session credentials for YouTube Music.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserAuth {
    pub headers: BTreeMap<String, String>,
}

impl BrowserAuth {
    /// Parse a raw header dump copied from the browser's network panel.
    ///
    /// Accepts `name: value` per line as well as the two-line layout some
    /// browsers produce (`name:` on one line, the value on the next).
    pub fn from_raw_headers(raw: &str) -> Result<Self> {
        let mut headers = BTreeMap::new();
        let mut pending_key: Option<String> = None;

        for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(key) = pending_key.take() {
                headers.insert(key, line.to_string());
                continue;
            }
            match line.split_once(':') {
                Some((key, value)) if !key.is_empty() && !key.starts_with(':') => {
                    let value = value.trim();
                    if value.is_empty() {
                        pending_key = Some(key.trim().to_lowercase());
                    } else {
                        headers.insert(key.trim().to_lowercase(), value.to_string());
                    }
                }
                // HTTP/2 pseudo headers (":authority: ...") and request lines carry nothing we need.
                _ => debug!("Ignoring header line: {}", line),
            }
        }

        headers.retain(|k, _| KEPT_HEADERS.contains(&k.as_str()));
        headers.entry("x-goog-authuser".into()).or_insert_with(|| "0".into());

        let auth = BrowserAuth { headers };
        auth.sapisid()
            .context("headers file does not contain a logged-in YouTube Music cookie")?;
        Ok(auth)
    }

    /// Parse `headers_raw_file` and write the generated auth file to `out_path`.
    pub fn setup(headers_raw_file: &Path, out_path: &Path) -> Result<Self> {
        if !headers_raw_file.is_file() {
            bail!("Headers file not found or invalid: {}", headers_raw_file.display());
        }
        let raw = std::fs::read_to_string(headers_raw_file)
            .with_context(|| format!("reading headers file {}", headers_raw_file.display()))?;
        let auth = Self::from_raw_headers(&raw)?;

        if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&auth.headers)?;
        std::fs::write(out_path, json)
            .with_context(|| format!("writing auth file {}", out_path.display()))?;
        info!("Generated auth file: {}", out_path.display());
        Ok(auth)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading auth file {}", path.display()))?;
        let headers: BTreeMap<String, String> = serde_json::from_str(&s)
            .with_context(|| format!("parsing auth file {}", path.display()))?;
        let auth = BrowserAuth { headers };
        auth.sapisid()?;
        Ok(auth)
    }

    pub fn cookie(&self) -> Option<&str> {
        self.headers.get("cookie").map(String::as_str)
    }

    /// The SAPISID cookie value used to sign requests.
    pub fn sapisid(&self) -> Result<String> {
        let cookie = self.cookie().ok_or_else(|| anyhow!("no cookie header"))?;
        let mut fallback = None;
        for pair in cookie.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else { continue };
            match name {
                "SAPISID" => return Ok(value.to_string()),
                "__Secure-3PAPISID" => fallback = Some(value.to_string()),
                _ => {}
            }
        }
        fallback.ok_or_else(|| anyhow!("cookie has no SAPISID entry"))
    }
}
