//! Summarization client configuration.
//!
//! The collaborator is optional. With `RXTRACE_SUMMARY_URL` unset the
//! service runs without it and summary requests answer 503.

use url::Url;

/// Connection settings for the summarization service.
///
/// Custom `Debug` implementation redacts the `api_token` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct SummaryConfig {
    /// Base URL. Requests go to `{base_url}v1/summaries`.
    pub base_url: Url,
    /// Optional bearer token.
    pub api_token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after a transient failure.
    pub max_retries: u32,
}

impl std::fmt::Debug for SummaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl SummaryConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default retry budget.
    pub const DEFAULT_MAX_RETRIES: u32 = 2;

    /// Build a configuration for `base_url` with defaults.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base("base_url", base_url)?,
            api_token: None,
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            max_retries: Self::DEFAULT_MAX_RETRIES,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `RXTRACE_SUMMARY_URL` (absent: returns `Ok(None)`)
    /// - `RXTRACE_SUMMARY_TOKEN` (optional)
    /// - `RXTRACE_SUMMARY_TIMEOUT_SECS` (default: 30)
    /// - `RXTRACE_SUMMARY_MAX_RETRIES` (default: 2)
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let raw = match std::env::var("RXTRACE_SUMMARY_URL") {
            Ok(v) if !v.trim().is_empty() => v,
            _ => return Ok(None),
        };
        Ok(Some(Self {
            base_url: parse_base("RXTRACE_SUMMARY_URL", &raw)?,
            api_token: std::env::var("RXTRACE_SUMMARY_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            timeout_secs: std::env::var("RXTRACE_SUMMARY_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Self::DEFAULT_TIMEOUT_SECS),
            max_retries: std::env::var("RXTRACE_SUMMARY_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Self::DEFAULT_MAX_RETRIES),
        }))
    }
}

/// Parse a base URL and make sure its path ends in `/` so relative
/// endpoint paths append instead of replacing the last segment.
fn parse_base(var: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid bearer token: contains characters not allowed in an HTTP header")]
    InvalidToken,
}
