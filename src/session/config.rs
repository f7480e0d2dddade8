//! Session manager configuration. Values are public endpoints and timings; do
//! not store secrets here.

use std::time::Duration;

/// Verification requests are aborted after this long.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(10);
/// Refresh cadence while a user is authenticated.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);
/// Timeout for login, refresh and logout calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct SessionConfig {
    api_base_url: String,
    app_host: String,
    cookie_domain: Option<String>,
    verify_timeout: Duration,
    refresh_interval: Duration,
    request_timeout: Duration,
}

impl SessionConfig {
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            app_host: "localhost".to_string(),
            cookie_domain: None,
            verify_timeout: DEFAULT_VERIFY_TIMEOUT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Host serving the dashboard; decides whether the cookie gets a `Domain`.
    #[must_use]
    pub fn with_app_host(mut self, host: impl Into<String>) -> Self {
        self.app_host = host.into();
        self
    }

    #[must_use]
    pub fn with_cookie_domain(mut self, domain: Option<String>) -> Self {
        self.cookie_domain = domain.and_then(|value| normalize_value(&value));
        self
    }

    #[must_use]
    pub fn with_verify_timeout(mut self, timeout: Duration) -> Self {
        self.verify_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    #[must_use]
    pub fn app_host(&self) -> &str {
        &self.app_host
    }

    #[must_use]
    pub fn cookie_domain(&self) -> Option<&str> {
        self.cookie_domain.as_deref()
    }

    #[must_use]
    pub fn verify_timeout(&self) -> Duration {
        self.verify_timeout
    }

    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
