//! JobTicketInvoice API client.
//!
//! Provides an async HTTP client with:
//! - Connection pooling via reqwest
//! - Retry with fixed delay, via the dispatch middleware
//! - Response caching for GET endpoints (5-minute TTL by default)
//! - Bearer-token auth header when configured

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{Config, api};
use crate::dispatch::{ApiRequest, Dispatcher, Method};
use crate::error::{ApiError, ApiResult};
use crate::models::{Invoice, InvoiceList, JobTicket, JobTicketList, Token, User};

/// JobTicketInvoice API client.
#[derive(Clone)]
pub struct JobTicketClient {
    /// HTTP transport.
    http: reqwest::Client,

    /// Dispatch middleware (logging, caching, retry).
    dispatcher: Dispatcher,

    /// API base URL.
    base_url: String,

    /// Bearer token (optional).
    auth_token: Option<String>,
}

impl JobTicketClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails or the auth token
    /// is not a valid header value.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "application/json".parse().expect("valid accept header"),
        );

        if let Some(ref token) = config.auth_token {
            let mut value: reqwest::header::HeaderValue =
                format!("Bearer {token}").parse()?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(api::MAX_KEEPALIVE)
            .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
            .gzip(true)
            .build()?;

        let dispatcher = Dispatcher::new(config.policy);

        Ok(Self { http, dispatcher, base_url: config.base_url, auth_token: config.auth_token })
    }

    /// Check if a bearer token is configured.
    #[must_use]
    pub fn has_auth_token(&self) -> bool {
        self.auth_token.is_some()
    }

    /// The dispatcher backing this client.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Drop one cached response, or every cached response when `key` is
    /// `None`. Call after mutations when a stale listing matters.
    pub async fn invalidate_cache(&self, key: Option<&str>) {
        self.dispatcher.clear(key).await;
    }

    // -------------------------------------------------------------------
    // Job tickets
    // -------------------------------------------------------------------

    /// List job tickets visible to the current user.
    pub async fn list_tickets(&self) -> ApiResult<JobTicketList> {
        self.dispatch(ApiRequest::get("/job-tickets/")).await
    }

    /// Get a single job ticket by ID.
    pub async fn get_ticket(&self, id: i64) -> ApiResult<JobTicket> {
        self.dispatch(ApiRequest::get(format!("/job-tickets/{id}"))).await
    }

    /// Create a job ticket (draft or otherwise) as the current user.
    pub async fn create_ticket(&self, ticket: &JobTicket) -> ApiResult<JobTicket> {
        let data = serde_json::to_value(ticket)?;
        self.dispatch(ApiRequest::post("/job-tickets/").with_data(data)).await
    }

    /// Submit a completed ticket. Unauthenticated; field technicians use
    /// this without an account.
    pub async fn submit_ticket(&self, ticket: &JobTicket) -> ApiResult<JobTicket> {
        let data = serde_json::to_value(ticket)?;
        self.dispatch(ApiRequest::post("/job-tickets/submit").with_data(data).public()).await
    }

    /// Update an existing job ticket.
    pub async fn update_ticket(&self, id: i64, ticket: &JobTicket) -> ApiResult<JobTicket> {
        let data = serde_json::to_value(ticket)?;
        self.dispatch(ApiRequest::put(format!("/job-tickets/{id}")).with_data(data)).await
    }

    /// Delete a job ticket.
    pub async fn delete_ticket(&self, id: i64) -> ApiResult<()> {
        self.dispatch(ApiRequest::delete(format!("/job-tickets/{id}"))).await
    }

    // -------------------------------------------------------------------
    // Invoices
    // -------------------------------------------------------------------

    /// List invoices visible to the current user.
    pub async fn list_invoices(&self) -> ApiResult<InvoiceList> {
        self.dispatch(ApiRequest::get("/invoices/")).await
    }

    /// Get a single invoice by ID.
    pub async fn get_invoice(&self, id: i64) -> ApiResult<Invoice> {
        self.dispatch(ApiRequest::get(format!("/invoices/{id}"))).await
    }

    /// Create an invoice from a job ticket.
    pub async fn create_invoice(&self, invoice: &Invoice) -> ApiResult<Invoice> {
        let data = serde_json::to_value(invoice)?;
        self.dispatch(ApiRequest::post("/invoices/").with_data(data)).await
    }

    /// Update an existing invoice.
    pub async fn update_invoice(&self, id: i64, invoice: &Invoice) -> ApiResult<Invoice> {
        let data = serde_json::to_value(invoice)?;
        self.dispatch(ApiRequest::put(format!("/invoices/{id}")).with_data(data)).await
    }

    // -------------------------------------------------------------------
    // Auth
    // -------------------------------------------------------------------

    /// Log in and obtain a bearer token.
    ///
    /// The backend speaks OAuth2 password flow, so credentials go as form
    /// fields rather than JSON; the password never enters the request
    /// descriptor and is not logged.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Token> {
        let http = self.http.clone();
        let url = format!("{}/auth/login", self.base_url);
        let form =
            vec![("username".to_string(), email.to_string()), ("password".to_string(), password.to_string())];

        self.dispatcher
            .execute(
                move |_req: ApiRequest| {
                    let http = http.clone();
                    let url = url.clone();
                    let form = form.clone();
                    async move {
                        let response =
                            http.post(&url).form(&form).send().await.map_err(ApiError::from)?;
                        let response = handle_response(response).await?;
                        response.json::<Token>().await.map_err(ApiError::from)
                    }
                },
                ApiRequest::post("/auth/login").public(),
            )
            .await
    }

    /// Get the currently authenticated user.
    pub async fn me(&self) -> ApiResult<User> {
        self.dispatch(ApiRequest::get("/auth/me")).await
    }

    // -------------------------------------------------------------------
    // Plumbing
    // -------------------------------------------------------------------

    /// Route a request through the dispatch middleware, with the actual
    /// network call supplied as the dispatched closure.
    async fn dispatch<T>(&self, request: ApiRequest) -> ApiResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let http = self.http.clone();
        let base = self.base_url.clone();

        self.dispatcher
            .execute(
                move |req: ApiRequest| {
                    let http = http.clone();
                    let url = format!("{}{}", base, req.endpoint);
                    async move {
                        let mut builder = match req.method {
                            Method::Get => http.get(&url),
                            Method::Post => http.post(&url),
                            Method::Put => http.put(&url),
                            Method::Patch => http.patch(&url),
                            Method::Delete => http.delete(&url),
                        };
                        if let Some(ref data) = req.data {
                            builder = builder.json(data);
                        }
                        let response = builder.send().await.map_err(ApiError::from)?;
                        let response = handle_response(response).await?;

                        // 204 has no body; deserialize T from null instead.
                        if response.status() == reqwest::StatusCode::NO_CONTENT {
                            serde_json::from_value(serde_json::Value::Null)
                                .map_err(ApiError::from)
                        } else {
                            response.json::<T>().await.map_err(ApiError::from)
                        }
                    }
                },
                request,
            )
            .await
    }
}

/// Map API response status codes to the error taxonomy.
async fn handle_response(response: reqwest::Response) -> ApiResult<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        401 => Err(ApiError::Unauthorized),
        403 => Err(ApiError::forbidden(error_detail(response).await)),
        404 => Err(ApiError::not_found(error_detail(response).await)),
        400 => Err(ApiError::bad_request(error_detail(response).await)),
        422 => Err(ApiError::validation(error_detail(response).await)),
        500..=599 => Err(ApiError::server(status.as_u16(), error_detail(response).await)),
        _ => Err(ApiError::UnexpectedStatus {
            status: status.as_u16(),
            message: error_detail(response).await,
        }),
    }
}

/// Pull the `detail` field out of a FastAPI-style error body, falling back
/// to the raw text.
async fn error_detail(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
        .unwrap_or(text)
}

impl std::fmt::Debug for JobTicketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobTicketClient")
            .field("base_url", &self.base_url)
            .field("has_auth_token", &self.has_auth_token())
            .finish()
    }
}
