//! Request dispatch middleware.
//!
//! Wraps an arbitrary async call with cross-cutting policies:
//! - Structured request/response logging via `tracing`
//! - Optional response caching for GET requests (TTL-based)
//! - Bounded retry with fixed delay between attempts
//!
//! The dispatcher never constructs or interprets HTTP details itself; the
//! caller supplies the call as a closure and the dispatcher layers policy
//! around it. Success values and errors pass through untransformed.

use std::fmt;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Dispatch policy. Immutable once a [`Dispatcher`] is built.
///
/// Missing fields fall back to defaults via struct-update syntax:
///
/// ```
/// use jobticket_client::dispatch::Policy;
///
/// let policy = Policy { retry_count: 2, ..Policy::default() };
/// assert!(policy.enable_logging);
/// ```
#[derive(Debug, Clone)]
pub struct Policy {
    /// Emit structured log lines per attempt.
    pub enable_logging: bool,

    /// Cache successful GET responses.
    pub enable_caching: bool,

    /// How long a cached response stays fresh.
    pub cache_duration: Duration,

    /// Number of additional attempts after a failure (total attempts = `retry_count + 1`).
    pub retry_count: u32,

    /// Fixed delay between consecutive attempts.
    pub retry_delay: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            enable_logging: true,
            enable_caching: false,
            cache_duration: Duration::from_secs(300),
            retry_count: 0,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// HTTP method of a dispatched request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET - the only cacheable method.
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    /// Uppercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Only GET responses are ever read from or written to the cache.
    #[must_use]
    pub const fn is_cacheable(self) -> bool {
        matches!(self, Self::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-invocation request descriptor. Created by the caller, not persisted.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Endpoint path or URL fragment, e.g. `/job-tickets/42`.
    pub endpoint: String,

    /// HTTP method. Defaults to GET.
    pub method: Method,

    /// Optional request payload.
    pub data: Option<serde_json::Value>,

    /// Whether the call needs an authenticated session. Informational at
    /// this layer; enforcement happens in the transport.
    pub requires_auth: bool,
}

impl ApiRequest {
    /// Create a request with an explicit method.
    #[must_use]
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), method, data: None, requires_auth: true }
    }

    /// GET request for `endpoint`.
    #[must_use]
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Get, endpoint)
    }

    /// POST request for `endpoint`.
    #[must_use]
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Post, endpoint)
    }

    /// PUT request for `endpoint`.
    #[must_use]
    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Put, endpoint)
    }

    /// PATCH request for `endpoint`.
    #[must_use]
    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Patch, endpoint)
    }

    /// DELETE request for `endpoint`.
    #[must_use]
    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Delete, endpoint)
    }

    /// Attach a JSON payload.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Mark the request as not requiring authentication.
    #[must_use]
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }
}

/// Request dispatch middleware.
///
/// Owns its policy and cache store; construct one per client, or use
/// [`Dispatcher::shared`] for the process-wide default instance.
#[derive(Clone)]
pub struct Dispatcher {
    policy: Policy,

    /// Response cache, keyed by [`Dispatcher::cache_key`]. Entries past
    /// `cache_duration` read as misses and are overwritten on the next
    /// successful fetch.
    cache: Cache<String, serde_json::Value>,
}

static SHARED: LazyLock<Dispatcher> = LazyLock::new(|| Dispatcher::new(Policy::default()));

impl Dispatcher {
    /// Create a dispatcher with the given policy.
    #[must_use]
    pub fn new(policy: Policy) -> Self {
        let cache = Cache::builder().time_to_live(policy.cache_duration).build();
        Self { policy, cache }
    }

    /// Process-wide default instance (default [`Policy`]).
    #[must_use]
    pub fn shared() -> &'static Self {
        &SHARED
    }

    /// The policy this dispatcher was built with.
    #[must_use]
    pub const fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Deterministic cache key: `method + ":" + endpoint + ":" + payload JSON`
    /// (`{}` when the payload is absent). `serde_json` serializes object keys
    /// in sorted order, so deep-equal payloads produce identical keys
    /// regardless of insertion order at the call site.
    #[must_use]
    pub fn cache_key(request: &ApiRequest) -> String {
        let data = request
            .data
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "{}".to_string());
        format!("{}:{}:{}", request.method, request.endpoint, data)
    }

    /// Execute `call` with logging, caching, and retry layered around it.
    ///
    /// - Cache read: fresh GET entries are returned without invoking `call`
    ///   (a cache hit is not a network attempt and logs no attempt lines).
    /// - Retry: on rejection, up to `retry_count` further attempts with a
    ///   fixed `retry_delay` between them. Every failure is treated as
    ///   retryable; classification belongs to the layers above.
    /// - Cache write: a successful GET unconditionally refreshes its entry.
    ///
    /// Resolves with exactly the value `call` produced; after exhausted
    /// retries, rejects with exactly the last error, unwrapped.
    ///
    /// # Errors
    ///
    /// Propagates the final error from `call` once retries are exhausted.
    pub async fn execute<F, Fut, T, E>(&self, call: F, request: ApiRequest) -> Result<T, E>
    where
        F: Fn(ApiRequest) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize + DeserializeOwned,
        E: fmt::Display,
    {
        let cacheable = self.policy.enable_caching && request.method.is_cacheable();
        let key = cacheable.then(|| Self::cache_key(&request));

        if let Some(key) = &key {
            if let Some(hit) = self.cache.get(key).await {
                // A cached value that no longer deserializes into the
                // caller's type reads as a miss and gets refetched.
                if let Ok(value) = serde_json::from_value::<T>(hit) {
                    if self.policy.enable_logging {
                        tracing::trace!(key = %key, "cache hit");
                    }
                    return Ok(value);
                }
            }
        }

        let log = self.policy.enable_logging;
        let mut attempts: u32 = 0;

        loop {
            if log {
                tracing::debug!(
                    method = %request.method,
                    endpoint = %request.endpoint,
                    payload = ?request.data,
                    attempt = attempts + 1,
                    "dispatching request"
                );
            }
            let started = Instant::now();

            match call(request.clone()).await {
                Ok(value) => {
                    if log {
                        tracing::debug!(
                            method = %request.method,
                            endpoint = %request.endpoint,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "request succeeded"
                        );
                    }
                    if let Some(key) = key {
                        match serde_json::to_value(&value) {
                            Ok(json) => self.cache.insert(key, json).await,
                            Err(err) => {
                                tracing::warn!(error = %err, "response not cacheable, skipping cache write");
                            }
                        }
                    }
                    return Ok(value);
                }
                Err(err) => {
                    if log {
                        tracing::error!(
                            method = %request.method,
                            endpoint = %request.endpoint,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            error = %err,
                            "request failed"
                        );
                    }
                    if attempts < self.policy.retry_count {
                        if log {
                            tracing::warn!(
                                delay_ms = self.policy.retry_delay.as_millis() as u64,
                                attempts_left = self.policy.retry_count - attempts,
                                "retrying after delay"
                            );
                        }
                        tokio::time::sleep(self.policy.retry_delay).await;
                        attempts += 1;
                    } else {
                        return Err(err);
                    }
                }
            }
        }
    }

    /// Remove one cache entry, or all of them when `key` is `None`.
    /// Never errors, even for absent keys.
    pub async fn clear(&self, key: Option<&str>) {
        match key {
            Some(key) => self.cache.invalidate(key).await,
            None => self.cache.invalidate_all(),
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").field("policy", &self.policy).finish()
    }
}
