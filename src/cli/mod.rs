use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the configuration comes from: local file or remote URL
#[derive(Debug, Clone)]
pub enum ConfigSource {
    File(PathBuf),
    Url(String),
}

impl ConfigSource {
    /// Interpret a `--config` value: http(s) URLs are fetched, anything else is a path.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(val) if val.starts_with("http://") || val.starts_with("https://") => {
                ConfigSource::Url(val.to_string())
            }
            Some(val) => ConfigSource::File(PathBuf::from(val)),
            None => ConfigSource::File(
                AppConfig::default_path().unwrap_or_else(|_| PathBuf::from("akm.toml")),
            ),
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(p) => write!(f, "{}", p.display()),
            ConfigSource::Url(u) => write!(f, "{}", u),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Web server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    /// When set, every route except /health requires this key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Maximum request body size in bytes (default: 1 MiB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            api_key: None,
            log_level: default_log_level(),
            max_body_size: default_max_body_size(),
        }
    }
}

fn default_port() -> u16 {
    3025
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

/// Profile store location
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Path to profiles.json (default: ~/.akm/profiles.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles_path: Option<String>,
}

impl StorageConfig {
    /// Configured path with a leading `~/` expanded, or the default location.
    pub fn resolved_profiles_path(&self) -> PathBuf {
        match self.profiles_path.as_deref().filter(|p| !p.is_empty()) {
            Some(p) => expand_home(p),
            None => crate::storage::ProfileStore::default_path(),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Timeout configuration for calls against profile APIs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutConfig {
    /// Deadline for one request, including reading the body
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout(),
            connect_timeout_ms: default_connect_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30_000 // 30 seconds
}

fn default_connect_timeout() -> u64 {
    10_000 // 10 seconds
}

/// Knobs of the credential check
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationConfig {
    /// Model used for the completion probe when /models lists nothing
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,
    /// User message of the completion probe
    #[serde(default = "default_probe_message")]
    pub probe_message: String,
    /// Largest generic-check body returned in `response`
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            fallback_model: default_fallback_model(),
            probe_message: default_probe_message(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

fn default_fallback_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_probe_message() -> String {
    "Hi".to_string()
}

fn default_max_response_bytes() -> usize {
    64 * 1024
}

impl AppConfig {
    /// Get default config file path
    /// Returns ~/.akm/config.toml (cross-platform)
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".akm").join("config.toml"))
    }

    /// Load configuration from a TOML file, creating a default one if missing
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            Self::create_default_config(path)?;
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_content(&content, &format!("{}", path.display()))
    }

    /// Load configuration from a ConfigSource (file path or URL)
    pub async fn from_source(source: &ConfigSource) -> Result<Self> {
        match source {
            ConfigSource::File(path) => Self::from_file(path),
            ConfigSource::Url(url) => {
                let content = reqwest::get(url)
                    .await
                    .with_context(|| format!("Failed to fetch config from {}", url))?
                    .error_for_status()
                    .with_context(|| format!("HTTP error fetching config from {}", url))?
                    .text()
                    .await
                    .with_context(|| format!("Failed to read config body from {}", url))?;
                Self::from_content(&content, url)
            }
        }
    }

    /// Parse configuration from TOML content string
    pub fn from_content(content: &str, source_label: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| format!("Failed to parse config from {}", source_label))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration for common errors
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("server.port must be greater than 0");
        }
        if self.timeouts.request_timeout_ms == 0 {
            anyhow::bail!("timeouts.request_timeout_ms must be greater than 0");
        }
        if self.timeouts.connect_timeout_ms == 0 {
            anyhow::bail!("timeouts.connect_timeout_ms must be greater than 0");
        }
        if self.validation.fallback_model.trim().is_empty() {
            anyhow::bail!("validation.fallback_model must not be empty");
        }
        if self.server.api_key.as_deref() == Some("") {
            anyhow::bail!("server.api_key is set but empty; remove it to disable auth");
        }
        Ok(())
    }

    fn create_default_config(path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(path, Self::default_config_content())
            .with_context(|| format!("Failed to write default config: {}", path.display()))?;
        tracing::info!("Created default config at {}", path.display());
        Ok(())
    }

    fn default_config_content() -> String {
        r#"# akm configuration

[server]
host = "127.0.0.1"
port = 3025
log_level = "info"
# api_key = "change-me"   # require this key on every route except /health

[storage]
# profiles_path = "~/.akm/profiles.json"

[timeouts]
request_timeout_ms = 30000
connect_timeout_ms = 10000

[validation]
fallback_model = "gpt-3.5-turbo"
probe_message = "Hi"
max_response_bytes = 65536
"#
        .to_string()
    }
}

/// Format a host:port pair as a bind address, bracketing IPv6 hosts.
pub fn format_bind_addr(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
