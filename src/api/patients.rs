//! Patient records.

use reqwest::Method;
use serde_json::Value;

use super::endpoints;
use super::error::ApiError;
use super::types::{Patient, unwrap_item, unwrap_list};
use super::AuthedClient;

impl AuthedClient<'_> {
    /// All patients assigned to `doctor_id` (payload under `data`).
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the list is malformed.
    pub async fn list_patients(&self, doctor_id: &str) -> Result<Vec<Patient>, ApiError> {
        let json = self.get(&endpoints::patients_of_doctor(doctor_id)?).await?;
        unwrap_list(json, "data")
    }

    /// One patient (payload under `patient`).
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the record is malformed.
    pub async fn get_patient(&self, patient_id: &str) -> Result<Patient, ApiError> {
        let json = self.get(&endpoints::patient(patient_id)?).await?;
        unwrap_item(json, "patient")
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn add_patient(&self, patient: &Patient) -> Result<Value, ApiError> {
        self.send(Method::POST, endpoints::PATIENTS, patient).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn update_patient(&self, patient_id: &str, patient: &Patient) -> Result<Value, ApiError> {
        self.send(Method::PUT, &endpoints::patient(patient_id)?, patient).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn delete_patient(&self, patient_id: &str) -> Result<Value, ApiError> {
        self.call(Method::DELETE, &endpoints::patient(patient_id)?).await
    }

    /// Mark a patient inactive without deleting the record.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn deactivate_patient(&self, patient_id: &str) -> Result<Value, ApiError> {
        self.call(Method::PATCH, &endpoints::patient_inactive(patient_id)?).await
    }

    /// Server-side search (`?q=`).
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the list is malformed.
    pub async fn search_patients(&self, query: &str) -> Result<Vec<Patient>, ApiError> {
        let builder = self.request(Method::GET, endpoints::PATIENTS_SEARCH).query(&[("q", query)]);
        let json = self.execute(builder).await?;
        unwrap_list(json, "data")
    }
}
