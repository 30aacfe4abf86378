//! REST client for the CareConnect backend.
//!
//! ARCHITECTURE
//! ============
//! `ApiClient` owns the `reqwest` client and base URL. Unauthenticated
//! calls (login, signup) go through it directly; everything else goes
//! through `AuthedClient`, a borrowed handle carrying the bearer token.
//! The token is passed explicitly rather than read from ambient storage so
//! the session layer decides which credential a request uses.
//!
//! ERROR HANDLING
//! ==============
//! Every call returns `Result<_, ApiError>`. Transport failures before a
//! response become `ApiError::Connectivity`; non-2xx responses become
//! `ApiError::Status` with the server's message extracted.

pub mod account;
pub mod appointments;
pub mod chats;
pub mod contexts;
pub mod endpoints;
pub mod error;
pub mod notifications;
pub mod patients;
pub mod profile;
pub mod types;

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::config::{Config, Timeouts};
pub use account::AccountApi;
pub use error::{ApiError, FaultClass};

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client for `base_url` (e.g. `http://127.0.0.1:8000/api`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the TLS backend fails to load.
    pub fn new(base_url: &str, timeouts: Timeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.request())
            .connect_timeout(timeouts.connect())
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the TLS backend fails to load.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.api_url, config.timeouts)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Borrow an authenticated handle for `token`.
    #[must_use]
    pub fn with_token<'a>(&'a self, token: &'a str) -> AuthedClient<'a> {
        AuthedClient { client: self, token }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub(crate) fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and decode a JSON response. Empty 2xx bodies decode as `Null`.
    pub(crate) async fn execute(&self, builder: RequestBuilder) -> Result<Value, ApiError> {
        let response = builder.send().await.map_err(|e| {
            tracing::debug!(error = %e, "request failed before a response arrived");
            error::from_transport(&e)
        })?;

        let status = response.status();
        let url = response.url().path().to_owned();
        let text = response.text().await.map_err(|e| error::from_transport(&e))?;
        tracing::debug!(%url, status = status.as_u16(), "response received");

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

// =============================================================================
// AUTHENTICATED HANDLE
// =============================================================================

/// Client handle that attaches `Authorization: Bearer <token>` to every call.
#[derive(Debug, Clone, Copy)]
pub struct AuthedClient<'a> {
    client: &'a ApiClient,
    token: &'a str,
}

impl AuthedClient<'_> {
    #[must_use]
    pub fn token(&self) -> &str {
        self.token
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, path, Some(self.token))
    }

    pub(crate) async fn execute(&self, builder: RequestBuilder) -> Result<Value, ApiError> {
        self.client.execute(builder).await
    }

    pub(crate) async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(self.request(Method::GET, path)).await
    }

    pub(crate) async fn send<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: &B) -> Result<Value, ApiError> {
        self.execute(self.request(method, path).json(body)).await
    }

    /// Body-less call (PATCH toggles, DELETE, POST actions).
    pub(crate) async fn call(&self, method: Method, path: &str) -> Result<Value, ApiError> {
        self.execute(self.request(method, path)).await
    }
}
