//! Profile edits for the signed-in user. Reading goes through
//! [`AccountApi::fetch_profile`](super::AccountApi::fetch_profile).

use std::path::Path;

use reqwest::Method;
use reqwest::multipart::Form;
use serde_json::{Map, Value};

use super::contexts::file_part;
use super::endpoints;
use super::error::ApiError;
use super::AuthedClient;

impl AuthedClient<'_> {
    /// Partial update: only the given fields are sent.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn update_profile(&self, fields: &Map<String, Value>) -> Result<Value, ApiError> {
        self.send(Method::PATCH, endpoints::USERS, fields).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if the file cannot be read, or an
    /// [`ApiError`] if the request fails.
    pub async fn upload_avatar(&self, path: &Path) -> Result<Value, ApiError> {
        let form = Form::new().part("avatar", file_part(path).await?);
        self.execute(self.request(Method::POST, endpoints::USERS_AVATAR).multipart(form)).await
    }
}
