//! Configuration loading for obsidian-mcp
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. Default values
//! 2. TOML file (`--config`, `OBSIDIAN_MCP_CONFIG_PATH`, or
//!    `<config_dir>/obsidian-mcp/config.toml`)
//! 3. Environment variables (`API_KEY`, `API_URLS`, `MCP_TRANSPORTS`, ...)
//! 4. CLI flags

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::healing::SelfHealingConfig;
use crate::transports::{AuthConfig, TransportKind, TransportsConfig};

/// Used when neither `API_URLS` nor a legacy host is configured
pub const DEFAULT_API_URL: &str = "https://127.0.0.1:27124";

const DEFAULT_API_PORT: u16 = 27124;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Obsidian Local REST API connection
    #[serde(default)]
    pub obsidian: ObsidianConfig,
    /// MCP transports
    #[serde(default)]
    pub transports: TransportsConfig,
}

/// REST API connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObsidianConfig {
    /// Candidate base URLs, tried in parallel at startup
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Legacy single host, used only when `urls` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Per-probe timeout in milliseconds
    #[serde(default = "default_test_timeout_ms")]
    pub test_timeout_ms: u64,
    /// Health check interval in milliseconds
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

fn default_test_timeout_ms() -> u64 {
    2000
}

fn default_retry_interval_ms() -> u64 {
    30_000
}

impl Default for ObsidianConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            api_key: None,
            host: None,
            port: None,
            test_timeout_ms: default_test_timeout_ms(),
            retry_interval_ms: default_retry_interval_ms(),
        }
    }
}

impl ObsidianConfig {
    /// Candidate URLs in priority order
    ///
    /// Explicit `urls` win; otherwise the legacy host/port pair forms a
    /// single candidate; otherwise [`DEFAULT_API_URL`].
    pub fn candidate_urls(&self) -> Vec<String> {
        if !self.urls.is_empty() {
            return self.urls.clone();
        }

        match self.host.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
            Some(host) => {
                let port = self.port.unwrap_or(DEFAULT_API_PORT);
                let host = host.trim_end_matches('/');
                if host.contains("://") {
                    vec![format!("{}:{}", host, port)]
                } else {
                    vec![format!("https://{}:{}", host, port)]
                }
            }
            None => vec![DEFAULT_API_URL.to_string()],
        }
    }
}

/// Parse `API_URLS`: a JSON array of strings, or a `;`/`,` separated list
pub fn parse_url_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        if let Ok(urls) = serde_json::from_str::<Vec<String>>(raw) {
            return urls
                .into_iter()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect();
        }
    }

    raw.split([';', ','])
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {}: {:?}", name, value))
}

fn looks_like_api_key(key: &str) -> bool {
    key.len() >= 32 && key.chars().all(|c| c.is_ascii_alphanumeric())
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::find_config_path(explicit_path) {
            Some(path) if path.exists() => {
                tracing::info!("Loading config from: {}", path.display());
                Self::from_file(&path)?
            }
            Some(path) if explicit_path.is_some() => {
                bail!("config file not found: {}", path.display());
            }
            _ => {
                tracing::debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    fn find_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit_path {
            return Some(path.to_path_buf());
        }

        dirs::config_dir().map(|dir| dir.join("obsidian-mcp").join("config.toml"))
    }

    /// Overlay environment variables read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let obsidian = &mut self.obsidian;

        if let Some(key) = lookup("API_KEY") {
            obsidian.api_key = Some(key);
        }
        if let Some(raw) = lookup("API_URLS") {
            let urls = parse_url_list(&raw);
            if !urls.is_empty() {
                obsidian.urls = urls;
            }
        }
        if let Some(host) = lookup("API_HOST") {
            obsidian.host = Some(host);
        }
        if let Some(port) = lookup("API_PORT") {
            obsidian.port = Some(parse_number("API_PORT", &port)?);
        }
        if let Some(timeout) = lookup("API_TEST_TIMEOUT") {
            obsidian.test_timeout_ms = parse_number("API_TEST_TIMEOUT", &timeout)?;
        }
        if let Some(interval) = lookup("API_RETRY_INTERVAL") {
            obsidian.retry_interval_ms = parse_number("API_RETRY_INTERVAL", &interval)?;
        }

        if let Some(list) = lookup("MCP_TRANSPORTS") {
            self.set_transports(&list);
        }

        let http = &mut self.transports.http;
        if let Some(host) = lookup("MCP_HTTP_HOST") {
            http.host = host;
        }
        if let Some(port) = lookup("MCP_HTTP_PORT") {
            http.port = parse_number("MCP_HTTP_PORT", &port)?;
        }
        if let Some(path) = lookup("MCP_HTTP_PATH") {
            http.path = path;
        }
        if let Some(token) = lookup("MCP_HTTP_TOKEN") {
            let token = token.trim();
            if !token.is_empty() {
                http.auth = Some(AuthConfig {
                    enabled: true,
                    token: Some(token.to_string()),
                    token_env_var: None,
                });
            }
        }

        Ok(())
    }

    /// Enable exactly the transports named in a comma separated list
    pub fn set_transports(&mut self, list: &str) {
        let mut stdio = false;
        let mut http = false;

        for name in list.split(',').filter(|n| !n.trim().is_empty()) {
            match TransportKind::parse(name) {
                Some(TransportKind::Stdio) => stdio = true,
                Some(TransportKind::Http) => http = true,
                None => tracing::warn!(transport = name.trim(), "Unknown transport, ignoring"),
            }
        }

        self.transports.stdio.enabled = stdio;
        self.transports.http.enabled = http;
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        let obsidian = &self.obsidian;

        match obsidian.api_key.as_deref() {
            None | Some("") => bail!("API_KEY is required"),
            Some(key) if !looks_like_api_key(key) => {
                tracing::warn!("API key looks invalid, expected at least 32 alphanumeric characters");
            }
            Some(_) => {}
        }

        for candidate in obsidian.candidate_urls() {
            let url = Url::parse(&candidate)
                .with_context(|| format!("invalid API URL: {}", candidate))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("unsupported scheme in API URL: {}", candidate);
            }
        }

        if obsidian.test_timeout_ms == 0 {
            bail!("API_TEST_TIMEOUT must be positive");
        }
        if obsidian.retry_interval_ms == 0 {
            bail!("API_RETRY_INTERVAL must be positive");
        }

        Ok(())
    }

    /// Settings for the self-healing client
    pub fn self_healing_config(&self) -> SelfHealingConfig {
        SelfHealingConfig {
            urls: self.obsidian.candidate_urls(),
            api_key: self.obsidian.api_key.clone().unwrap_or_default(),
            test_timeout: Duration::from_millis(self.obsidian.test_timeout_ms),
            retry_interval: Duration::from_millis(self.obsidian.retry_interval_ms),
        }
    }
}
