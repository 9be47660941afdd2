use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{
    DEFAULT_COUNTDOWN_START, DEFAULT_HINT_INTERVAL_MS, DEFAULT_HINT_VISIBLE_MS,
    DEFAULT_MESSAGING_BASE_URL, MAX_COUNTDOWN_START,
};

pub const MAX_URL_LENGTH: usize = 2048;

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("countdown start {value} exceeds maximum of {max}")]
    CountdownTooLong { value: u32, max: u32 },

    #[error("hint timing invalid: {reason}")]
    InvalidHintTiming { reason: String },
}

/// An absolute http(s) URL with a host and no embedded credentials.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatedUrl {
    url: String,
    host: String,
}

impl ValidatedUrl {
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let invalid = |reason: &str| ConfigError::InvalidUrl {
            url: truncate_url(&url),
            reason: reason.to_string(),
        };

        if url.trim().is_empty() {
            return Err(invalid("URL cannot be empty"));
        }
        if url.len() > MAX_URL_LENGTH {
            return Err(invalid("URL is too long"));
        }

        let parsed = Url::parse(&url).map_err(|e| invalid(&e.to_string()))?;

        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(invalid("only 'http' and 'https' are allowed"));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| invalid("missing host"))?
            .to_lowercase();

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(invalid("credentials in URL are not allowed"));
        }

        Ok(Self { url, host })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

fn truncate_url(url: &str) -> String {
    if url.len() <= 100 {
        url.to_string()
    } else {
        let cut = (0..=100).rev().find(|&i| url.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &url[..cut])
    }
}

/// Deployment settings handed over by the shell in `Event::AppStarted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteConfig {
    /// Spreadsheet script receiving leads. Empty means not configured.
    pub lead_endpoint: String,
    pub messaging_base_url: String,
    /// Seconds shown on the thank-you page before redirecting.
    pub countdown_start: u32,
    pub hint_interval_ms: u64,
    pub hint_visible_ms: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            lead_endpoint: String::new(),
            messaging_base_url: DEFAULT_MESSAGING_BASE_URL.to_string(),
            countdown_start: DEFAULT_COUNTDOWN_START,
            hint_interval_ms: DEFAULT_HINT_INTERVAL_MS,
            hint_visible_ms: DEFAULT_HINT_VISIBLE_MS,
        }
    }
}

impl SiteConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.lead_endpoint.is_empty() {
            ValidatedUrl::new(self.lead_endpoint.as_str())?;
        }
        ValidatedUrl::new(self.messaging_base_url.as_str())?;

        if self.countdown_start > MAX_COUNTDOWN_START {
            return Err(ConfigError::CountdownTooLong {
                value: self.countdown_start,
                max: MAX_COUNTDOWN_START,
            });
        }

        if self.hint_interval_ms == 0 || self.hint_visible_ms == 0 {
            return Err(ConfigError::InvalidHintTiming {
                reason: "durations must be non-zero".into(),
            });
        }

        Ok(())
    }
}
