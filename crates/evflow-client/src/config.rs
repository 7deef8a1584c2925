//! Client configuration
//!
//! Sources, lowest precedence first:
//!
//! 1. YAML file (explicit path, or `<config dir>/evflow/config.yaml`)
//! 2. Environment: `EVFLOW_API_URL`, `EVFLOW_API_TOKEN`, `EVFLOW_API_TIMEOUT_SECS`
//! 3. Explicit overrides (CLI flags)
//!
//! ```yaml
//! base_url: https://api.example.com/v1
//! token: ${EVFLOW_TOKEN}
//! timeout_secs: 20
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ApiError, ApiResult};

pub const ENV_API_URL: &str = "EVFLOW_API_URL";
pub const ENV_API_TOKEN: &str = "EVFLOW_API_TOKEN";
pub const ENV_API_TIMEOUT: &str = "EVFLOW_API_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the flow API
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClientConfig {
    /// Backend base URL, e.g. `https://api.example.com/v1`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Bearer token (or `${VAR}` reference)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            token: Some(token.into()),
            timeout_secs: None,
        }
    }

    /// `<config dir>/evflow/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("evflow").join("config.yaml"))
    }

    pub fn from_file(path: &Path) -> ApiResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ApiError::config(format!("cannot read {}: {}", path.display(), e)))?;
        let mut config: Self = serde_yaml::from_str(&content)
            .map_err(|e| ApiError::config(format!("invalid config {}: {}", path.display(), e)))?;
        if let Some(ref token) = config.token {
            config.token = Some(expand_env_var(token)?);
        }
        tracing::debug!("Loaded client config: {}", path.display());
        Ok(config)
    }

    pub fn from_env() -> ApiResult<Self> {
        let timeout_secs = match std::env::var(ENV_API_TIMEOUT) {
            Ok(v) => Some(v.trim().parse::<u64>().map_err(|_| {
                ApiError::config(format!("{} must be a number of seconds, got `{}`", ENV_API_TIMEOUT, v))
            })?),
            Err(_) => None,
        };
        Ok(Self {
            base_url: std::env::var(ENV_API_URL).ok(),
            token: std::env::var(ENV_API_TOKEN).ok(),
            timeout_secs,
        })
    }

    /// Fields set in `other` win
    pub fn merge(self, other: Self) -> Self {
        Self {
            base_url: other.base_url.or(self.base_url),
            token: other.token.or(self.token),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
        }
    }

    /// File (explicit or default, if present) overlaid with the environment
    pub fn load(path: Option<&Path>) -> ApiResult<Self> {
        let file = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        Ok(file.merge(Self::from_env()?))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Base URL and token, both required before any request
    pub fn require(&self) -> ApiResult<(url::Url, &str)> {
        let raw = self
            .base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ApiError::config(format!("base URL not set (use --api-url or {})", ENV_API_URL)))?;
        let url = url::Url::parse(raw)
            .map_err(|e| ApiError::config(format!("invalid base URL `{}`: {}", raw, e)))?;
        let token = self
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ApiError::config(format!("API token not set (use --token or {})", ENV_API_TOKEN)))?;
        Ok((url, token))
    }
}

/// Expand `${VAR_NAME}` references; unknown variables are left as written
fn expand_env_var(value: &str) -> ApiResult<String> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| ApiError::config(e.to_string()))?;
    let mut result = value.to_string();

    for cap in re.captures_iter(value) {
        if let Ok(var_value) = std::env::var(&cap[1]) {
            result = result.replace(&cap[0], &var_value);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_config_file() {
        std::env::set_var("EVFLOW_TEST_TOKEN_A", "secret123");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_url: https://api.example.com/v1\ntoken: ${{EVFLOW_TEST_TOKEN_A}}\ntimeout_secs: 5"
        )
        .unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("https://api.example.com/v1"));
        assert_eq!(config.token.as_deref(), Some("secret123"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        std::env::remove_var("EVFLOW_TEST_TOKEN_A");
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let file = ClientConfig {
            base_url: Some("https://file.example.com".into()),
            token: Some("file-token".into()),
            timeout_secs: Some(10),
        };
        let flags = ClientConfig {
            base_url: None,
            token: Some("flag-token".into()),
            timeout_secs: None,
        };
        let merged = file.merge(flags);
        assert_eq!(merged.base_url.as_deref(), Some("https://file.example.com"));
        assert_eq!(merged.token.as_deref(), Some("flag-token"));
        assert_eq!(merged.timeout_secs, Some(10));
    }

    #[test]
    fn test_require_reports_missing_fields() {
        assert!(matches!(ClientConfig::default().require(), Err(ApiError::Config(_))));

        let no_token = ClientConfig {
            base_url: Some("https://api.example.com".into()),
            ..Default::default()
        };
        assert!(matches!(no_token.require(), Err(ApiError::Config(_))));

        let bad_url = ClientConfig::new("not a url", "t");
        assert!(matches!(bad_url.require(), Err(ApiError::Config(_))));

        let ok = ClientConfig::new("https://api.example.com", "t");
        assert!(ok.require().is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::new("https://api.example.com", "very-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
