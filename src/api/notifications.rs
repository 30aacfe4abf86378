//! Notifications inbox.

use reqwest::Method;
use serde_json::Value;

use super::endpoints;
use super::error::ApiError;
use super::types::{Notification, unwrap_list};
use super::AuthedClient;

impl AuthedClient<'_> {
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the list is malformed.
    pub async fn list_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let json = self.get(endpoints::NOTIFICATIONS).await?;
        unwrap_list(json, "notifications")
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<Value, ApiError> {
        self.call(Method::PATCH, &endpoints::notification_read(notification_id)?).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn mark_notification_unread(&self, notification_id: &str) -> Result<Value, ApiError> {
        self.call(Method::PATCH, &endpoints::notification_unread(notification_id)?).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn delete_notification(&self, notification_id: &str) -> Result<Value, ApiError> {
        self.call(Method::DELETE, &endpoints::notification(notification_id)?).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn mark_all_notifications_read(&self) -> Result<Value, ApiError> {
        self.call(Method::PATCH, endpoints::NOTIFICATIONS_MARK_ALL_READ).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn clear_notifications(&self) -> Result<Value, ApiError> {
        self.call(Method::DELETE, endpoints::NOTIFICATIONS_CLEAR_ALL).await
    }
}
