//! Configuration file for the Crew server.
//!
//! Looked up at `$CREW_CONFIG`, falling back to `~/.crew/config.toml`. A missing
//! file is not an error; every field has a default.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:3000"
//!
//! [recaptcha]
//! endpoint = "https://www.google.com/recaptcha/api/siteverify"
//! timeout_secs = 10
//! ```
//!
//! String values support `${ENV_VAR}` expansion. The verification policy
//! itself (`ENABLE_RECAPTCHA`, `RECAPTCHA_SECRET_KEY`) is read from the
//! environment by `crew_recaptcha::policy`, not from this file.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crew_recaptcha::ClientSettings;
use crew_recaptcha::client::DEFAULT_TIMEOUT_SECS;
use serde::Deserialize;

pub const CONFIG_PATH_VAR: &str = "CREW_CONFIG";

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Default, Deserialize)]
pub struct CrewConfig {
    pub server: Option<ServerConfig>,
    pub recaptcha: Option<RecaptchaConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on. Default: `127.0.0.1:3000`.
    pub bind: Option<String>,
}

/// `siteverify` client settings.
#[derive(Debug, Default, Deserialize)]
pub struct RecaptchaConfig {
    pub endpoint: Option<String>,
    /// Request timeout. Default: 10. Zero is treated as unset.
    pub timeout_secs: Option<u64>,
    /// Allow a plain-HTTP endpoint. Only for local mock providers.
    #[serde(default)]
    pub allow_insecure_endpoint: bool,
}

pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unclosed: keep the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

impl CrewConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::from_path(&path).map(Some)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        self.server
            .as_ref()
            .and_then(|server| server.bind.as_deref())
            .map(expand_env_vars)
            .filter(|bind| !bind.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }

    #[must_use]
    pub fn client_settings(&self) -> ClientSettings {
        let mut settings = ClientSettings::default();
        let Some(recaptcha) = self.recaptcha.as_ref() else {
            return settings;
        };

        if let Some(endpoint) = recaptcha
            .endpoint
            .as_deref()
            .map(expand_env_vars)
            .filter(|endpoint| !endpoint.trim().is_empty())
        {
            settings.endpoint = endpoint;
        }
        let timeout_secs = recaptcha
            .timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        settings.timeout = Duration::from_secs(timeout_secs);
        settings.allow_insecure_endpoint = recaptcha.allow_insecure_endpoint;
        settings
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_VAR)
        && !path.is_empty()
    {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".crew").join("config.toml"))
}
