use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::capabilities::{DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS};

pub const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_CAPTCHA_MAX_BYTES: usize = 512 * 1024;
pub const DEFAULT_CAPTCHA_MAX_DIMENSION: u32 = 1024;
pub const DEFAULT_ADMIN_LOG_LIMIT: u32 = 50;
pub const MAX_ADMIN_LOG_LIMIT: u32 = 1000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base_url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("{field} must be in 1..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("cannot build URL for '{path}': {reason}")]
    Join { path: String, reason: String },
}

/// Runtime settings supplied by the shell through `Event::Configure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Absolute origin of the lookup service. `None` keeps site-relative paths.
    pub base_url: Option<String>,
    pub request_timeout_ms: u64,
    /// Searches drive a scrape on the server and get a longer deadline.
    pub search_timeout_ms: u64,
    pub captcha_max_bytes: usize,
    pub captcha_max_dimension: u32,
    pub admin_log_limit: u32,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            search_timeout_ms: DEFAULT_SEARCH_TIMEOUT_MS,
            captcha_max_bytes: DEFAULT_CAPTCHA_MAX_BYTES,
            captcha_max_dimension: DEFAULT_CAPTCHA_MAX_DIMENSION,
            admin_log_limit: DEFAULT_ADMIN_LOG_LIMIT,
        }
    }
}

impl WizardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base) = &self.base_url {
            Self::parse_base(base)?;
        }

        check_range("request_timeout_ms", self.request_timeout_ms, MAX_TIMEOUT_MS)?;
        check_range("search_timeout_ms", self.search_timeout_ms, MAX_TIMEOUT_MS)?;
        check_range(
            "captcha_max_bytes",
            self.captcha_max_bytes as u64,
            16 * 1024 * 1024,
        )?;
        check_range(
            "captcha_max_dimension",
            u64::from(self.captcha_max_dimension),
            8192,
        )?;
        check_range(
            "admin_log_limit",
            u64::from(self.admin_log_limit),
            u64::from(MAX_ADMIN_LOG_LIMIT),
        )?;
        Ok(())
    }

    /// Resolves an API path (`/api/...`) against `base_url`.
    pub fn endpoint_url(&self, path: &str) -> Result<String, ConfigError> {
        match &self.base_url {
            None => Ok(path.to_string()),
            Some(base) => Self::parse_base(base)?
                .join(path)
                .map(|u| u.to_string())
                .map_err(|e| ConfigError::Join {
                    path: path.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    fn parse_base(base: &str) -> Result<Url, ConfigError> {
        let url = Url::parse(base).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base.to_string(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidBaseUrl {
                url: base.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if url.username() != "" || url.password().is_some() {
            return Err(ConfigError::InvalidBaseUrl {
                url: base.to_string(),
                reason: "credentials in URL are not allowed".to_string(),
            });
        }
        Ok(url)
    }
}

fn check_range(field: &'static str, value: u64, max: u64) -> Result<(), ConfigError> {
    if value == 0 || value > max {
        return Err(ConfigError::OutOfRange { field, value, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(WizardConfig::default().validate().is_ok());
    }

    #[test]
    fn relative_paths_without_base() {
        let config = WizardConfig::default();
        assert_eq!(config.endpoint_url("/api/states").unwrap(), "/api/states");
    }

    #[test]
    fn joins_with_base() {
        let config = WizardConfig {
            base_url: Some("https://lookup.example.org/app/".into()),
            ..WizardConfig::default()
        };
        assert_eq!(
            config.endpoint_url("/api/logs?limit=5").unwrap(),
            "https://lookup.example.org/api/logs?limit=5"
        );
    }

    #[test]
    fn rejects_bad_scheme_and_credentials() {
        let ftp = WizardConfig {
            base_url: Some("ftp://files.example.org".into()),
            ..WizardConfig::default()
        };
        assert!(matches!(ftp.validate(), Err(ConfigError::InvalidBaseUrl { .. })));

        let creds = WizardConfig {
            base_url: Some("https://user:pw@example.org".into()),
            ..WizardConfig::default()
        };
        assert!(creds.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = WizardConfig {
            request_timeout_ms: 0,
            ..WizardConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "request_timeout_ms",
                value: 0,
                max: MAX_TIMEOUT_MS,
            })
        );
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: WizardConfig =
            serde_json::from_str(r#"{ "search_timeout_ms": 90000 }"#).unwrap();
        assert_eq!(config.search_timeout_ms, 90_000);
        assert_eq!(config.request_timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}
