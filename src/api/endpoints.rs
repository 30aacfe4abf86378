//! Backend paths, relative to the configured API base URL.
//!
//! Ids are spliced in as single percent-encoded path segments, so an id
//! can never address a different endpoint.

use std::fmt::Write;

use super::error::ApiError;

pub const AUTH_LOGIN: &str = "/auth/login";
pub const AUTH_SIGNUP: &str = "/auth/signup";
pub const AUTH_LOGOUT: &str = "/auth/logout";
pub const AUTH_REFRESH: &str = "/auth/refresh";

/// Current user profile (read with GET, update with PATCH).
pub const USERS: &str = "/users";
pub const USERS_AVATAR: &str = "/users/avatar";

pub const PATIENTS: &str = "/patients";
pub const PATIENTS_SEARCH: &str = "/patients/search";

pub const GLOBAL_CONTEXTS: &str = "/contexts/globals";
pub const CONTEXT_UPLOAD: &str = "/contexts/upload";

pub const NOTIFICATIONS: &str = "/notifications";
pub const NOTIFICATIONS_MARK_ALL_READ: &str = "/notifications/mark-all-read";
pub const NOTIFICATIONS_CLEAR_ALL: &str = "/notifications/clear-all";

pub const APPOINTMENTS: &str = "/appointments";

pub(crate) fn patients_of_doctor(doctor_id: &str) -> Result<String, ApiError> {
    Ok(format!("/patients/all/{}", segment(doctor_id)?))
}

pub(crate) fn patient(patient_id: &str) -> Result<String, ApiError> {
    Ok(format!("/patients/{}", segment(patient_id)?))
}

pub(crate) fn patient_inactive(patient_id: &str) -> Result<String, ApiError> {
    Ok(format!("/patients/inactive/{}", segment(patient_id)?))
}

pub(crate) fn global_context(context_id: &str) -> Result<String, ApiError> {
    Ok(format!("/contexts/globals/{}", segment(context_id)?))
}

/// Local contexts are listed and created per appointment, but updated and
/// deleted by their own id under the same prefix.
pub(crate) fn local_contexts(id: &str) -> Result<String, ApiError> {
    Ok(format!("/contexts/locals/{}", segment(id)?))
}

pub(crate) fn chats(appointment_id: &str) -> Result<String, ApiError> {
    Ok(format!("/chats/{}", segment(appointment_id)?))
}

pub(crate) fn chat_message(appointment_id: &str) -> Result<String, ApiError> {
    Ok(format!("/chats/{}/message", segment(appointment_id)?))
}

pub(crate) fn chat_history(appointment_id: &str) -> Result<String, ApiError> {
    Ok(format!("/chats/{}/history", segment(appointment_id)?))
}

pub(crate) fn notification(notification_id: &str) -> Result<String, ApiError> {
    Ok(format!("/notifications/{}", segment(notification_id)?))
}

pub(crate) fn notification_read(notification_id: &str) -> Result<String, ApiError> {
    Ok(format!("/notifications/{}/read", segment(notification_id)?))
}

pub(crate) fn notification_unread(notification_id: &str) -> Result<String, ApiError> {
    Ok(format!("/notifications/{}/unread", segment(notification_id)?))
}

pub(crate) fn appointment(appointment_id: &str) -> Result<String, ApiError> {
    Ok(format!("/appointments/{}", segment(appointment_id)?))
}

/// Percent-encode `id` as one path segment (RFC 3986 unreserved set kept).
/// Empty, `.` and `..` ids are rejected: URL parsing folds dot segments,
/// encoded or not, into the parent path.
pub(crate) fn segment(id: &str) -> Result<String, ApiError> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(ApiError::InvalidRequest(format!("invalid record id {id:?}")));
    }
    let mut encoded = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    Ok(encoded)
}

#[cfg(test)]
#[path = "endpoints_test.rs"]
mod tests;
