//! Configuration for the HTTP adapters.

use std::time::Duration;

use fsb_core::BackendError;
use url::Url;

use crate::error::HttpError;

/// Default base URL of a local file-browser API.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Configuration for [`crate::HttpBackend`] and [`crate::HttpTransfer`].
///
/// The base URL is validated when the configuration is created, so an
/// adapter built from it never sees a malformed API address.
///
/// # Example
///
/// ```
/// use fsb_http::BackendConfig;
/// use std::time::Duration;
///
/// let config = BackendConfig::parse("http://localhost:8080/api")
///     .unwrap()
///     .with_max_retries(5)
///     .with_retry_delay(Duration::from_millis(250));
/// assert_eq!(config.base_url().path(), "/api");
///
/// assert!(BackendConfig::parse("ftp://files.example").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub(crate) base_url: Url,
    pub(crate) user_agent: String,
    /// Applies to job endpoints only.
    pub(crate) timeout: Duration,
    pub(crate) token: Option<String>,
    /// Retries for idempotent requests; see [`crate::HttpBackend`].
    pub(crate) max_retries: u8,
    pub(crate) retry_base_delay: Duration,
}

impl BackendConfig {
    /// Create a configuration for the API at an already parsed `base_url`.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            user_agent: concat!("fsb/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
            token: None,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }

    /// Parse `base_url` and create a configuration for it.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Transport` if `base_url` is not an absolute
    /// `http` or `https` URL.
    pub fn parse(base_url: &str) -> Result<Self, BackendError> {
        let url = Url::parse(base_url).map_err(HttpError::from)?;
        check_api_url(&url)?;
        Ok(Self::new(url))
    }

    /// Point the configuration at another API.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Request timeout for job endpoints, 30 seconds by default.
    ///
    /// Bucket transfers are not subject to it.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send `token` as a bearer token with every job request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_optional_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub const fn with_max_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    /// First backoff delay; doubles on every further retry.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Base URL of the API.
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }
}

fn check_api_url(url: &Url) -> Result<(), BackendError> {
    match url.scheme() {
        "http" | "https" if !url.cannot_be_a_base() => Ok(()),
        scheme => Err(BackendError::transport(format!(
            "Unsupported API URL scheme '{scheme}' in {url}"
        ))),
    }
}
