//! Client configuration.
//!
//! [`ClientConfig`] is built once and then shared read-only by every call a
//! client makes.

use std::time::Duration;

use crate::error::SkaldError;

/// Default URL for the Skald API
pub const DEFAULT_BASE_URL: &str = "https://api.useskald.com";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "SKALD_API_KEY";

/// Environment variable overriding the base URL
pub const BASE_URL_ENV: &str = "SKALD_BASE_URL";

/// Configuration for a [`SkaldClient`](crate::SkaldClient).
///
/// # Example
///
/// ```ignore
/// use skald::ClientConfig;
///
/// let config = ClientConfig::new("sk_live_...")
///     .with_base_url("https://skald.internal/")
///     .with_timeout(Duration::from_secs(60));
/// ```
#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    /// Bearer token sent with every request
    pub api_key: String,
    /// API root without a trailing slash (default: https://api.useskald.com)
    pub base_url: String,
    /// Overall request timeout applied by the reqwest transport (default: none)
    pub timeout: Option<Duration>,
    /// User-Agent header (default: skald-rust/<version>)
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a configuration with default base URL and no timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            user_agent: format!("skald-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Read `SKALD_API_KEY` and the optional `SKALD_BASE_URL`.
    pub fn from_env() -> Result<Self, SkaldError> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| SkaldError::Config(format!("{} is not set", API_KEY_ENV)))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config = config.with_base_url(base_url);
        }
        Ok(config)
    }

    /// Set the base URL. Trailing slashes are trimmed; an empty value keeps the default.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let trimmed = base_url.trim_end_matches('/');
        if !trimmed.is_empty() {
            self.base_url = trimmed.to_string();
        }
        self
    }

    /// Set the overall request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Value for the Authorization header.
    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

// Keeps the API key out of logs and panic messages.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_base_url() {
        let config = ClientConfig::new("test-key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_key, "test-key");
        assert!(config.timeout.is_none());
        assert!(config.user_agent.starts_with("skald-rust/"));
    }

    #[test]
    fn test_custom_base_url() {
        let config = ClientConfig::new("k").with_base_url("https://custom.api.com");
        assert_eq!(config.base_url, "https://custom.api.com");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ClientConfig::new("k").with_base_url("https://custom.api.com//");
        assert_eq!(config.base_url, "https://custom.api.com");
    }

    #[test]
    fn test_empty_base_url_keeps_default() {
        let config = ClientConfig::new("k").with_base_url("");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_bearer() {
        assert_eq!(ClientConfig::new("abc").bearer(), "Bearer abc");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let debug = format!("{:?}", ClientConfig::new("super-secret"));
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var(API_KEY_ENV, "env-key");
        std::env::set_var(BASE_URL_ENV, "http://localhost:9000/");
        let config = ClientConfig::from_env().unwrap();
        std::env::remove_var(API_KEY_ENV);
        std::env::remove_var(BASE_URL_ENV);

        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.base_url, "http://localhost:9000");
    }

    #[test]
    #[serial]
    fn test_from_env_missing_key() {
        std::env::remove_var(API_KEY_ENV);
        let err = ClientConfig::from_env().unwrap_err();
        assert!(matches!(err, SkaldError::Config(_)));
    }
}
