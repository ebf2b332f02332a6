//! Error types for the JobTicketInvoice API client.
//!
//! Uses `thiserror` for structured error handling with automatic `From`
//! implementations. This taxonomy lives one layer above the dispatch
//! middleware, which passes errors through without classifying them.

/// Errors from the HTTP client layer.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Missing or expired credentials (401 response)
    #[error("Not authenticated")]
    Unauthorized,

    /// Authenticated but not allowed (403 response)
    #[error("Access denied: {message}")]
    Forbidden {
        /// Error message from API
        message: String,
    },

    /// Resource not found (404 response)
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Invalid request parameters (400 response)
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message from API
        message: String,
    },

    /// Request body failed validation (422 response)
    #[error("Validation failed: {message}")]
    Validation {
        /// Validation detail from API
        message: String,
    },

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl ApiError {
    /// Create a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Returns true if retrying the request could plausibly succeed.
    ///
    /// The dispatch middleware retries every failure uniformly; this
    /// classification is for callers that want to surface guidance to users.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Server { .. })
    }
}

/// Result type alias for API client operations.
pub type ApiResult<T> = Result<T, ApiError>;
