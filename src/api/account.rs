//! Account API: login, signup, logout and the current-user profile.

use reqwest::Method;
use serde_json::Value;

use super::endpoints;
use super::error::ApiError;
use super::types::{AuthResponse, DOCTOR_ACCOUNT_TYPE, LoginRequest, Registration, UserProfile, unwrap_item};
use super::{ApiClient, AuthedClient};

/// The backend calls the session layer depends on. Enables mocking in tests.
#[async_trait::async_trait]
pub trait AccountApi: Send + Sync {
    /// `POST /auth/login` as a doctor.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-2xx response.
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError>;

    /// `POST /auth/signup`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-2xx response.
    async fn signup(&self, registration: &Registration) -> Result<AuthResponse, ApiError>;

    /// `POST /auth/logout` for `token`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-2xx response.
    async fn logout(&self, token: &str) -> Result<(), ApiError>;

    /// `GET /users` for `token`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, a non-2xx response, or
    /// a body that is not a profile.
    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, ApiError>;
}

#[async_trait::async_trait]
impl AccountApi for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest { account_type: DOCTOR_ACCOUNT_TYPE, email, password };
        let json = self.execute(self.request(Method::POST, endpoints::AUTH_LOGIN, None).json(&body)).await?;
        decode_auth_response(json)
    }

    async fn signup(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        let json = self
            .execute(self.request(Method::POST, endpoints::AUTH_SIGNUP, None).json(registration))
            .await?;
        decode_auth_response(json)
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.with_token(token).call(Method::POST, endpoints::AUTH_LOGOUT).await?;
        Ok(())
    }

    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, ApiError> {
        let json = self.with_token(token).get(endpoints::USERS).await?;
        decode_profile(json)
    }
}

impl AuthedClient<'_> {
    /// `POST /auth/refresh`: exchange the current token for a fresh one.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-2xx response.
    pub async fn refresh_token(&self) -> Result<AuthResponse, ApiError> {
        let json = self.call(Method::POST, endpoints::AUTH_REFRESH).await?;
        decode_auth_response(json)
    }
}

pub(crate) fn decode_auth_response(json: Value) -> Result<AuthResponse, ApiError> {
    if json.is_null() {
        return Ok(AuthResponse::default());
    }
    serde_json::from_value(json).map_err(|e| ApiError::Decode(e.to_string()))
}

/// The profile arrives bare or wrapped under `user` / `data`.
pub(crate) fn decode_profile(json: Value) -> Result<UserProfile, ApiError> {
    let key = if json.get("user").is_some_and(Value::is_object) { "user" } else { "data" };
    unwrap_item(json, key)
}
