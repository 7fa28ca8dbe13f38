//! Client configuration.
//!
//! Configuration can be loaded from:
//! - A TOML file (default: ~/.config/notebook/config.toml, `[client]` table)
//! - Environment variables (NOTEBOOK_* prefixed)
//!
//! # Example
//!
//! ```rust,no_run
//! use notebook_client::config::ClientConfig;
//!
//! // Load from default path or fall back to env vars
//! let config = ClientConfig::load().expect("Failed to load config");
//!
//! // Or from environment variables only
//! let config = ClientConfig::from_env();
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notebook_core::defaults;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for notebook_core::Error {
    fn from(e: ConfigError) -> Self {
        notebook_core::Error::Config(e.to_string())
    }
}

/// Endpoints and limits for the HTTP clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the notes backend.
    pub notes_base_url: String,
    /// Base URL of the AI service (summary, quiz, mind map, status).
    pub ai_base_url: String,
    /// Base URL hosting the extraction endpoints.
    pub extract_base_url: String,
    /// Timeout for CRUD and generation requests.
    pub request_timeout_secs: u64,
    /// Overall bound on extraction, fallback attempt included.
    pub extract_timeout_secs: u64,
    /// Largest document accepted for extraction.
    pub max_upload_bytes: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            notes_base_url: defaults::BASE_URL.to_string(),
            ai_base_url: defaults::BASE_URL.to_string(),
            extract_base_url: defaults::BASE_URL.to_string(),
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            extract_timeout_secs: defaults::EXTRACT_TIMEOUT_SECS,
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
        }
    }
}

impl ClientConfig {
    /// Point every endpoint at one base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            notes_base_url: base_url.clone(),
            ai_base_url: base_url.clone(),
            extract_base_url: base_url,
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }

    /// Get the default config file path.
    ///
    /// Returns: ~/.config/notebook/config.toml
    pub fn default_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        path.push("notebook");
        path.push("config.toml");
        path
    }

    /// Load configuration from the default path, falling back to environment
    /// variables when the file does not exist.
    pub fn load() -> ConfigResult<Self> {
        let path = Self::default_config_path();

        if path.exists() {
            info!("Loading client config from: {}", path.display());
            Self::from_file(&path)
        } else {
            debug!(
                "Config file not found at {}, using environment variables",
                path.display()
            );
            let config = Self::from_env();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a TOML file. Missing keys take defaults;
    /// environment variables still override file values.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;

        #[derive(Deserialize)]
        struct TomlRoot {
            #[serde(default)]
            client: ClientConfig,
        }

        let root: TomlRoot = toml::from_str(&content)?;
        let config = root.client.apply_overrides(|name| env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables over defaults.
    pub fn from_env() -> Self {
        Self::default().apply_overrides(|name| env::var(name).ok())
    }

    /// Apply NOTEBOOK_* overrides from an arbitrary variable source.
    ///
    /// `NOTEBOOK_API_URL` also moves the AI and extraction URLs unless they
    /// are set explicitly.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(defaults::ENV_API_URL) {
            if self.ai_base_url == self.notes_base_url {
                self.ai_base_url = url.clone();
            }
            if self.extract_base_url == self.notes_base_url {
                self.extract_base_url = url.clone();
            }
            self.notes_base_url = url;
        }
        if let Some(url) = lookup(defaults::ENV_AI_URL) {
            self.ai_base_url = url;
        }
        if let Some(url) = lookup(defaults::ENV_EXTRACT_URL) {
            self.extract_base_url = url;
        }
        if let Some(secs) = parse_var(&lookup, defaults::ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = secs;
        }
        if let Some(secs) = parse_var(&lookup, defaults::ENV_EXTRACT_TIMEOUT_SECS) {
            self.extract_timeout_secs = secs;
        }
        if let Some(bytes) = parse_var(&lookup, defaults::ENV_MAX_UPLOAD_BYTES) {
            self.max_upload_bytes = bytes;
        }
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, url) in [
            ("notes_base_url", &self.notes_base_url),
            ("ai_base_url", &self.ai_base_url),
            ("extract_base_url", &self.extract_base_url),
        ] {
            if url.is_empty() {
                return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Validation(format!(
                    "{} must start with http:// or https://, got: {}",
                    name, url
                )));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.extract_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "extract_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Validation(
                "max_upload_bytes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_var<F>(lookup: &F, name: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = name, value = %raw, "Ignoring non-numeric environment override");
            None
        }
    }
}
