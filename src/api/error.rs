//! API error taxonomy and fault classification.
//!
//! The one question the session layer asks of a failed call is whether a
//! response reached us at all. `ApiError::Connectivity` is produced only
//! where that is known not to be the case (send failures, interrupted
//! bodies); every server-issued status becomes `ApiError::Status`.

use serde_json::Value;

const CONNECTIVITY_MESSAGE: &str = "Unable to reach the server. Check your connection and try again.";
const DECODE_MESSAGE: &str = "Unexpected response from the server.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response reached the client (DNS, refused connection, timeout,
    /// body cut off mid-transfer).
    #[error("server unreachable: {0}")]
    Connectivity(String),

    /// The server answered with a non-success HTTP status.
    #[error("server returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The server answered 2xx but the body did not match the expected shape.
    #[error("response parse failed: {0}")]
    Decode(String),

    /// The request could not be built (bad header value, unreadable upload).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// How a failed Account API call bears on an existing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// The server was never heard from; the local session stays valid.
    Connectivity,
    /// The server (or its response) disowned the credential.
    Rejection,
}

impl ApiError {
    /// Build a status error, pulling a human message out of the body.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_server_message(body).unwrap_or_else(|| format!("Request failed with status {status}"));
        Self::Status { status, message }
    }

    /// True when no response was received.
    #[must_use]
    pub fn is_connectivity_fault(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }

    /// True when the server explicitly refused the credential.
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }

    /// 401 from any endpoint: the bearer token is no longer accepted.
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify for session reconciliation: anything but a connectivity
    /// fault means the server had its say.
    #[must_use]
    pub fn fault_class(&self) -> FaultClass {
        if self.is_connectivity_fault() { FaultClass::Connectivity } else { FaultClass::Rejection }
    }

    /// Message suitable for showing inline next to a form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Connectivity(_) => CONNECTIVITY_MESSAGE.to_owned(),
            Self::Status { message, .. } => message.clone(),
            Self::Decode(_) => DECODE_MESSAGE.to_owned(),
            Self::InvalidRequest(detail) | Self::HttpClientBuild(detail) => detail.clone(),
        }
    }
}

/// Map a `reqwest` failure from `send()` or a body read.
pub(crate) fn from_transport(error: &reqwest::Error) -> ApiError {
    if error.is_builder() {
        return ApiError::InvalidRequest(error.to_string());
    }
    if error.is_decode() {
        return ApiError::Decode(error.to_string());
    }
    ApiError::Connectivity(error.to_string())
}

/// Pull the first useful message out of an error body.
///
/// Looks at `detail` (string, or a list of `{msg}` validation entries),
/// then `message`, then `error`. Non-JSON bodies are used verbatim when
/// short and printable.
pub(crate) fn extract_server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Ok(json) = serde_json::from_str::<Value>(trimmed) else {
        let plain = trimmed.len() <= 200 && !trimmed.starts_with('<');
        return plain.then(|| trimmed.to_owned());
    };

    if let Some(detail) = json.get("detail") {
        match detail {
            Value::String(s) if !s.is_empty() => return Some(s.clone()),
            Value::Array(items) => {
                let msgs: Vec<&str> = items.iter().filter_map(|i| i.get("msg").and_then(Value::as_str)).collect();
                if !msgs.is_empty() {
                    return Some(msgs.join("; "));
                }
            }
            _ => {}
        }
    }
    ["message", "error"]
        .iter()
        .filter_map(|key| json.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
