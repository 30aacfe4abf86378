//! Wire types for the CareConnect backend.
//!
//! DESIGN
//! ======
//! The backend is loosely typed: ids arrive as numbers or strings, list
//! endpoints wrap their payload under endpoint-specific keys, and records
//! carry more fields than the dashboard reads. Every record keeps unknown
//! fields in a flattened `extra` map so a fetch-edit-save cycle never drops
//! data the client did not model.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::error::ApiError;

// =============================================================================
// RECORD ID
// =============================================================================

/// Server-assigned identifier. Accepts JSON numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Numeric ids go back out as numbers so the server sees what it sent.
        match self.0.parse::<u64>() {
            Ok(n) if n.to_string() == self.0 => serializer.serialize_u64(n),
            _ => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self(s)),
            Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(serde::de::Error::custom(format!("expected string or number id, got {other}"))),
        }
    }
}

/// Lenient optional integer: accepts numbers, numeric strings, empty strings.
fn de_opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_u64().and_then(|v| u32::try_from(v).ok())),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<u32>().map(Some).map_err(serde::de::Error::custom),
        Some(other) => Err(serde::de::Error::custom(format!("expected integer, got {other}"))),
    }
}

// =============================================================================
// ACCOUNT
// =============================================================================

/// Profile snapshot of the signed-in user, cached alongside the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Login/signup response. Only the token is required for a session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    #[serde(default, alias = "access_token")]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    #[serde(rename = "type")]
    pub account_type: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Account type sent on login and signup; the dashboard is doctor-only.
pub const DOCTOR_ACCOUNT_TYPE: &str = "doctor";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "type", default = "doctor_account_type")]
    pub account_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn doctor_account_type() -> String {
    DOCTOR_ACCOUNT_TYPE.to_owned()
}

impl Registration {
    #[must_use]
    pub fn doctor(name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            account_type: doctor_account_type(),
            extra: Map::new(),
        }
    }
}

// =============================================================================
// PATIENTS
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientStatus {
    #[default]
    Active,
    Inactive,
    Discharged,
    #[serde(other)]
    Unknown,
}

impl PatientStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Discharged => "Discharged",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, deserialize_with = "de_opt_u32", skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub emergency_contact: String,
    #[serde(default)]
    pub medical_history: String,
    #[serde(default)]
    pub allergies: String,
    #[serde(default)]
    pub current_medications: String,
    #[serde(default)]
    pub status: PatientStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<RecordId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

fn de_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NotificationKind, D::Error> {
    Option::<NotificationKind>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Unknown or missing `type` values land in `Other`, which no inbox group shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Emergency,
    Update,
    Reminder,
    Results,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: RecordId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default, deserialize_with = "de_kind")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "isRead", default)]
    pub is_read: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// CONTEXTS, CHATS, APPOINTMENTS
// =============================================================================

/// A reference file or note attached globally or to one appointment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Scope of an uploaded context file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextScope {
    Global,
    Local,
}

impl ContextScope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Local => "local",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// `"doctor"` for the signed-in side; anything else is the patient/assistant.
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// ENVELOPES
// =============================================================================

/// Decode a list that is either a bare array or wrapped under `key`.
/// A wrapper object without `key` decodes as an empty list.
pub(crate) fn unwrap_list<T: DeserializeOwned>(body: Value, key: &str) -> Result<Vec<T>, ApiError> {
    let list = match body {
        Value::Array(_) => body,
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Null) | None => return Ok(Vec::new()),
            Some(inner) => inner,
        },
        other => return Err(ApiError::Decode(format!("expected list or object, got {other}"))),
    };
    serde_json::from_value(list).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Decode a record that is either bare or wrapped under `key`.
pub(crate) fn unwrap_item<T: DeserializeOwned>(body: Value, key: &str) -> Result<T, ApiError> {
    let item = match body {
        Value::Object(mut map) if matches!(map.get(key), Some(Value::Object(_))) => map.remove(key).unwrap_or_default(),
        other => other,
    };
    serde_json::from_value(item).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
