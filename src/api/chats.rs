//! Appointment chats.

use reqwest::Method;
use serde_json::{Value, json};

use super::endpoints;
use super::error::ApiError;
use super::types::{ChatMessage, unwrap_list};
use super::AuthedClient;

impl AuthedClient<'_> {
    /// Message history for an appointment (payload under `messages`).
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the list is malformed.
    pub async fn chat_history(&self, appointment_id: &str) -> Result<Vec<ChatMessage>, ApiError> {
        let json = self.get(&endpoints::chat_history(appointment_id)?).await?;
        unwrap_list(json, "messages")
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn list_chats(&self, appointment_id: &str) -> Result<Value, ApiError> {
        self.get(&endpoints::chats(appointment_id)?).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn create_chat(&self, appointment_id: &str, chat: &Value) -> Result<Value, ApiError> {
        self.send(Method::POST, &endpoints::chats(appointment_id)?, chat).await
    }

    /// Send a doctor-side message.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn send_chat_message(&self, appointment_id: &str, message: &str) -> Result<Value, ApiError> {
        let body = json!({ "sender": "doctor", "message": message });
        self.send(Method::POST, &endpoints::chat_message(appointment_id)?, &body).await
    }
}
