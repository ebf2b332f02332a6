//! Configuration for the JobTicketInvoice API client.

use std::time::Duration;

use crate::dispatch::Policy;

/// API configuration constants.
pub mod api {
    use std::time::Duration;

    /// Default base URL for the JobTicketInvoice API.
    pub const BASE_URL: &str = "http://localhost:8000/api";

    /// Request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Cache TTL for GET responses (5 minutes).
    pub const CACHE_TTL: Duration = Duration::from_secs(300);

    /// Additional attempts after a failed request.
    pub const RETRY_COUNT: u32 = 2;

    /// Fixed delay between retry attempts.
    pub const RETRY_DELAY: Duration = Duration::from_secs(1);

    /// Maximum keepalive connections.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Keepalive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the API (for testing with mock servers).
    pub base_url: String,

    /// Bearer token for authenticated endpoints (optional).
    pub auth_token: Option<String>,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Dispatch policy (logging, caching, retry).
    pub policy: Policy,
}

impl Config {
    /// Create a configuration with an optional bearer token.
    #[must_use]
    pub fn new(auth_token: Option<String>) -> Self {
        Self {
            base_url: api::BASE_URL.to_string(),
            auth_token,
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            policy: Policy {
                enable_caching: true,
                cache_duration: api::CACHE_TTL,
                retry_count: api::RETRY_COUNT,
                retry_delay: api::RETRY_DELAY,
                ..Policy::default()
            },
        }
    }

    /// Create a test configuration pointed at a mock server.
    ///
    /// Retries are kept but with no delay, and the cache TTL is short so
    /// expiry is observable in tests.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            auth_token: None,
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            policy: Policy {
                enable_caching: true,
                cache_duration: Duration::from_millis(200),
                retry_count: 2,
                retry_delay: Duration::from_millis(0),
                ..Policy::default()
            },
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `JOBTICKET_API_URL` (optional, defaults to [`api::BASE_URL`])
    /// and `JOBTICKET_AUTH_TOKEN` (optional).
    ///
    /// # Errors
    ///
    /// Returns error if environment variables are invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        let auth_token = std::env::var("JOBTICKET_AUTH_TOKEN").ok();
        let mut config = Self::new(auth_token);
        if let Ok(url) = std::env::var("JOBTICKET_API_URL") {
            config.base_url = url;
        }
        Ok(config)
    }

    /// Check if a bearer token is configured.
    #[must_use]
    pub const fn has_auth_token(&self) -> bool {
        self.auth_token.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None)
    }
}
