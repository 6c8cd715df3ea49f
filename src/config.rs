//! Client configuration.
//!
//! Everything the controller needs to reach the extraction service lives in
//! [`ClientConfig`], built via its [`ClientConfigBuilder`]. The only
//! environment-level setting is the service base URL, read once at startup by
//! [`ClientConfig::from_env`].

use crate::error::Pdf2XlsxError;
use crate::observer::ObserverHandle;
use reqwest::Url;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the extraction service base URL.
pub const BASE_URL_ENV: &str = "PDF2XLSX_API_BASE_URL";

/// Base URL used when [`BASE_URL_ENV`] is not set (the service's default bind).
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Path appended to the base URL for submissions.
pub const UPLOAD_PATH: &str = "/upload";

/// Configuration for a [`crate::controller::SubmissionController`].
///
/// # Example
/// ```rust
/// use pdf2xlsx::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::builder()
///     .base_url("https://extract.example.com")
///     .request_timeout(Duration::from_secs(90))
///     .build()
///     .unwrap();
/// assert_eq!(config.upload_url(), "https://extract.example.com/upload");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Service base URL, without the `/upload` suffix. Default: `http://localhost:5000`.
    pub base_url: String,

    /// Upper bound on one request/response round trip. Default: 120 s.
    ///
    /// Extraction of a long catalogue can take a while, but an unbounded wait
    /// would leave the session stuck in `Submitting`. Expiry is reported as a
    /// transport failure.
    pub request_timeout: Duration,

    /// Receives a notification after every state change.
    pub observer: Option<ObserverHandle>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(120),
            observer: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn SessionObserver>"))
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a config whose base URL comes from [`BASE_URL_ENV`].
    ///
    /// Falls back to [`DEFAULT_BASE_URL`] when the variable is unset or empty.
    pub fn from_env() -> Result<Self, Pdf2XlsxError> {
        Self::from_env_value(std::env::var(BASE_URL_ENV).ok())
    }

    fn from_env_value(value: Option<String>) -> Result<Self, Pdf2XlsxError> {
        let mut builder = Self::builder();
        match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            Some(url) => builder = builder.base_url(url),
            None => debug!("{} not set, using {}", BASE_URL_ENV, DEFAULT_BASE_URL),
        }
        builder.build()
    }

    /// Full URL of the submission endpoint.
    pub fn upload_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), UPLOAD_PATH)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout = Duration::from_secs(secs);
        self
    }

    pub fn observer(mut self, observer: ObserverHandle) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, Pdf2XlsxError> {
        let c = &self.config;
        let url = Url::parse(&c.base_url).map_err(|e| {
            Pdf2XlsxError::InvalidConfig(format!("base URL '{}' is not valid: {}", c.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Pdf2XlsxError::InvalidConfig(format!(
                "base URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if c.request_timeout.is_zero() {
            return Err(Pdf2XlsxError::InvalidConfig(
                "Request timeout must be > 0".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_service() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.upload_url(), "http://localhost:5000/upload");
    }

    #[test]
    fn upload_url_tolerates_trailing_slash_and_path() {
        let config = ClientConfig::builder()
            .base_url("https://api.example.com/v1/")
            .build()
            .unwrap();
        assert_eq!(config.upload_url(), "https://api.example.com/v1/upload");
    }

    #[test]
    fn build_rejects_bad_urls() {
        assert!(matches!(
            ClientConfig::builder().base_url("not a url").build(),
            Err(Pdf2XlsxError::InvalidConfig(_))
        ));
        assert!(matches!(
            ClientConfig::builder().base_url("ftp://files.example.com").build(),
            Err(Pdf2XlsxError::InvalidConfig(_))
        ));
    }

    #[test]
    fn build_rejects_zero_timeout() {
        let err = ClientConfig::builder()
            .request_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn env_value_overrides_default() {
        let config =
            ClientConfig::from_env_value(Some("http://10.0.0.5:8080".into())).unwrap();
        assert_eq!(config.upload_url(), "http://10.0.0.5:8080/upload");

        let config = ClientConfig::from_env_value(Some("   ".into())).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);

        let config = ClientConfig::from_env_value(None).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
