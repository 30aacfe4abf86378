//! Global and per-appointment context files.

use std::path::Path;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::endpoints;
use super::error::ApiError;
use super::types::{ContextEntry, ContextScope, unwrap_list};
use super::AuthedClient;

impl AuthedClient<'_> {
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the list is malformed.
    pub async fn list_global_contexts(&self) -> Result<Vec<ContextEntry>, ApiError> {
        let json = self.get(endpoints::GLOBAL_CONTEXTS).await?;
        unwrap_list(json, "contexts")
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the list is malformed.
    pub async fn list_local_contexts(&self, appointment_id: &str) -> Result<Vec<ContextEntry>, ApiError> {
        let json = self.get(&endpoints::local_contexts(appointment_id)?).await?;
        unwrap_list(json, "contexts")
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn add_global_context(&self, entry: &ContextEntry) -> Result<Value, ApiError> {
        self.send(Method::POST, endpoints::GLOBAL_CONTEXTS, entry).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn add_local_context(&self, appointment_id: &str, entry: &ContextEntry) -> Result<Value, ApiError> {
        self.send(Method::POST, &endpoints::local_contexts(appointment_id)?, entry).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn update_context(&self, scope: ContextScope, context_id: &str, entry: &ContextEntry) -> Result<Value, ApiError> {
        self.send(Method::PUT, &context_path(scope, context_id)?, entry).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn delete_context(&self, scope: ContextScope, context_id: &str) -> Result<Value, ApiError> {
        self.call(Method::DELETE, &context_path(scope, context_id)?).await
    }

    /// Upload a file as multipart `file` + `type` (+ `appointmentId` when local).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if the file cannot be read, or an
    /// [`ApiError`] if the request fails.
    pub async fn upload_context_file(
        &self,
        path: &Path,
        scope: ContextScope,
        appointment_id: Option<&str>,
    ) -> Result<Value, ApiError> {
        let part = file_part(path).await?;
        let mut form = Form::new().part("file", part).text("type", scope.as_str());
        if let Some(appointment_id) = appointment_id {
            form = form.text("appointmentId", appointment_id.to_owned());
        }
        self.execute(self.request(Method::POST, endpoints::CONTEXT_UPLOAD).multipart(form)).await
    }
}

fn context_path(scope: ContextScope, context_id: &str) -> Result<String, ApiError> {
    match scope {
        ContextScope::Global => endpoints::global_context(context_id),
        ContextScope::Local => endpoints::local_contexts(context_id),
    }
}

/// Read a file into a multipart part named after the file.
pub(crate) async fn file_part(path: &Path) -> Result<Part, ApiError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("cannot read {}: {e}", path.display())))?;
    let name = path
        .file_name()
        .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
    Ok(Part::bytes(bytes).file_name(name))
}
