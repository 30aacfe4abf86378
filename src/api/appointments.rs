//! Appointments.

use reqwest::Method;
use serde_json::Value;

use super::endpoints;
use super::error::ApiError;
use super::types::{Appointment, unwrap_item, unwrap_list};
use super::AuthedClient;

impl AuthedClient<'_> {
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the list is malformed.
    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, ApiError> {
        let json = self.get(endpoints::APPOINTMENTS).await?;
        unwrap_list(json, "appointments")
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the record is malformed.
    pub async fn get_appointment(&self, appointment_id: &str) -> Result<Appointment, ApiError> {
        let json = self.get(&endpoints::appointment(appointment_id)?).await?;
        unwrap_item(json, "appointment")
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn create_appointment(&self, appointment: &Appointment) -> Result<Value, ApiError> {
        self.send(Method::POST, endpoints::APPOINTMENTS, appointment).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn update_appointment(&self, appointment_id: &str, appointment: &Appointment) -> Result<Value, ApiError> {
        self.send(Method::PUT, &endpoints::appointment(appointment_id)?, appointment).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn delete_appointment(&self, appointment_id: &str) -> Result<Value, ApiError> {
        self.call(Method::DELETE, &endpoints::appointment(appointment_id)?).await
    }
}
