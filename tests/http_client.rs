//! HTTP-level tests: the real `ApiClient` against a throwaway axum backend.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Multipart, Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use careconnect::api::types::{ContextScope, RecordId};
use careconnect::config::Timeouts;
use careconnect::storage::{TOKEN_KEY, USER_KEY};
use careconnect::{AccountApi, ApiClient, ApiError, MemoryStorage, SessionStatus, SessionStorage, SessionStore, VerifyOutcome};
use serde_json::{Value, json};

const LIVE_TOKEN: &str = "tok-live";

// =============================================================================
// FAKE BACKEND
// =============================================================================

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer tok-live")
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Could not validate credentials" }))).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    let valid = body["type"] == "doctor" && body["email"] == "test@email.com" && body["password"] == "test1234";
    if valid {
        Json(json!({ "token": LIVE_TOKEN, "token_type": "bearer" })).into_response()
    } else {
        unauthorized_credentials()
    }
}

fn unauthorized_credentials() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Invalid credentials" }))).into_response()
}

/// Token the profile endpoint still accepts but every service refuses.
const EXPIRING_TOKEN: &str = "tok-expiring";

async fn profile(headers: HeaderMap) -> Response {
    let expiring = headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer tok-expiring");
    if !authorized(&headers) && !expiring {
        return unauthorized();
    }
    Json(json!({
        "user": { "id": 1, "name": "Dr. Jennifer Martinez", "email": "doctor@careconnect.com", "role": "doctor" }
    }))
    .into_response()
}

async fn refresh(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "access_token": "tok-rotated" })).into_response()
}

async fn logout() -> Json<Value> {
    Json(json!({ "message": "Logged out" }))
}

async fn patients_of_doctor(headers: HeaderMap, Path(doctor_id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "data": [
        { "id": 1, "name": "John Smith", "status": "Active", "doctorId": doctor_id },
        { "id": 2, "name": "Sarah Johnson", "status": "Inactive", "age": 32 }
    ]}))
    .into_response()
}

async fn patient_by_id(Path(patient_id): Path<String>) -> Json<Value> {
    Json(json!({ "patient": { "id": patient_id, "name": "Echo" } }))
}

async fn search_patients(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let q = params.get("q").cloned().unwrap_or_default();
    Json(json!([{ "id": "p-1", "name": q }]))
}

async fn mark_read(headers: HeaderMap, Path(_id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn notifications() -> Json<Value> {
    Json(json!({ "notifications": [
        { "id": 1, "title": "Emergency Alert", "type": "emergency", "isRead": false },
        { "id": 2, "title": "Patient Update", "type": "update", "isRead": true }
    ]}))
}

async fn chat_history(Path(appointment_id): Path<String>) -> Json<Value> {
    Json(json!({ "messages": [
        { "id": 1, "sender": "doctor", "message": format!("hello {appointment_id}"), "timestamp": "2024-01-20T09:15:00Z" }
    ]}))
}

async fn upload(mut multipart: Multipart) -> Json<Value> {
    let mut fields = serde_json::Map::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_owned();
        let file_name = field.file_name().map(str::to_owned);
        let text = String::from_utf8_lossy(&field.bytes().await.unwrap()).into_owned();
        fields.insert(name, json!({ "file_name": file_name, "text": text }));
    }
    Json(Value::Object(fields))
}

async fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "<html>upstream failed</html>").into_response()
}

async fn not_json() -> &'static str {
    "ok"
}

async fn spawn_backend() -> String {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh", post(refresh))
        .route("/users", get(profile))
        .route("/patients/all/{doctor_id}", get(patients_of_doctor))
        .route("/patients/search", get(search_patients))
        .route("/patients/{patient_id}", get(patient_by_id))
        .route("/notifications", get(notifications))
        .route("/notifications/{id}/read", patch(mark_read))
        .route("/chats/{appointment_id}/history", get(chat_history))
        .route("/contexts/upload", post(upload))
        .route("/appointments", get(broken))
        .route("/contexts/globals", get(not_json));
    let app = Router::new().nest("/api", api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}/api/")
}

/// Base URL of a port nothing listens on.
async fn dead_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

fn client(base_url: &str) -> ApiClient {
    ApiClient::new(base_url, Timeouts { request_secs: 5, connect_secs: 2 }).unwrap()
}

fn store(api: ApiClient, storage: Arc<MemoryStorage>) -> SessionStore {
    SessionStore::new(Arc::new(api), storage)
}

fn persisted(token: &str) -> Arc<MemoryStorage> {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(TOKEN_KEY, token).unwrap();
    storage.set(USER_KEY, r#"{"id":1,"name":"Cached","email":"c@x.org","role":"doctor"}"#).unwrap();
    storage
}

// =============================================================================
// ACCOUNT + SESSION
// =============================================================================

#[tokio::test]
async fn login_over_http_establishes_session() {
    let base = spawn_backend().await;
    let storage = Arc::new(MemoryStorage::new());
    let session = store(client(&base), storage.clone());
    assert!(session.restore().await.is_none());

    let outcome = session.login("test@email.com", "test1234").await;
    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(session.session().user().unwrap().name, "Dr. Jennifer Martinez");
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some(LIVE_TOKEN));

    session.logout().await;
    assert_eq!(session.status(), SessionStatus::Unauthenticated);
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn wrong_password_over_http_is_displayable() {
    let base = spawn_backend().await;
    let session = store(client(&base), Arc::new(MemoryStorage::new()));
    session.restore().await;

    let outcome = session.login("test@email.com", "wrongpass").await;
    assert_eq!(outcome.error(), Some("Invalid credentials"));
    assert_eq!(session.status(), SessionStatus::Unauthenticated);
}

#[tokio::test]
async fn unreachable_backend_is_connectivity_fault() {
    let api = client(&dead_backend().await);
    let err = api.fetch_profile(LIVE_TOKEN).await.unwrap_err();
    assert!(err.is_connectivity_fault(), "{err:?}");
}

#[tokio::test]
async fn restore_against_unreachable_backend_keeps_session() {
    let storage = persisted("tok-offline");
    let session = store(client(&dead_backend().await), storage.clone());

    let verify = session.restore().await.unwrap();
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(verify.await.unwrap(), VerifyOutcome::Tolerated);
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(session.session().user().unwrap().name, "Cached");
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("tok-offline"));
}

#[tokio::test]
async fn restore_with_revoked_token_signs_out() {
    let base = spawn_backend().await;
    let storage = persisted("tok-revoked");
    let session = store(client(&base), storage.clone());

    let verify = session.restore().await.unwrap();
    assert_eq!(verify.await.unwrap(), VerifyOutcome::Rejected);
    assert_eq!(session.status(), SessionStatus::Unauthenticated);
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get(USER_KEY).unwrap(), None);
}

#[tokio::test]
async fn restore_with_live_token_refreshes_profile() {
    let base = spawn_backend().await;
    let storage = persisted(LIVE_TOKEN);
    let session = store(client(&base), storage.clone());

    assert_eq!(session.restore().await.unwrap().await.unwrap(), VerifyOutcome::Confirmed);
    assert_eq!(session.session().user().unwrap().name, "Dr. Jennifer Martinez");
    assert!(storage.get(USER_KEY).unwrap().unwrap().contains("Jennifer"));
}

#[tokio::test]
async fn refresh_accepts_access_token_alias() {
    let api = client(&spawn_backend().await);
    let refreshed = api.with_token(LIVE_TOKEN).refresh_token().await.unwrap();
    assert_eq!(refreshed.token.as_deref(), Some("tok-rotated"));
}

// =============================================================================
// SERVICES
// =============================================================================

#[tokio::test]
async fn patients_list_and_search() {
    let api = client(&spawn_backend().await);
    let authed = api.with_token(LIVE_TOKEN);

    let patients = authed.list_patients("1").await.unwrap();
    assert_eq!(patients.len(), 2);
    assert_eq!(patients[0].doctor_id, Some(RecordId::from("1")));
    assert_eq!(patients[1].age, Some(32));

    let found = authed.search_patients("Jane Doe").await.unwrap();
    assert_eq!(found[0].name, "Jane Doe");
}

#[tokio::test]
async fn services_require_valid_token() {
    let api = client(&spawn_backend().await);
    let err = api.with_token("nope").list_patients("1").await.unwrap_err();
    assert!(err.is_auth_rejection());
    assert_eq!(err.user_message(), "Could not validate credentials");
}

#[tokio::test]
async fn reserved_characters_in_ids_stay_in_one_segment() {
    let api = client(&spawn_backend().await);
    let authed = api.with_token(LIVE_TOKEN);

    let patient = authed.get_patient("7/../../users?x=1").await.unwrap();
    assert_eq!(patient.id, Some(RecordId::from("7/../../users?x=1")));

    let err = authed.delete_patient("..").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
}

#[tokio::test]
async fn unauthorized_service_call_ends_session() {
    let base = spawn_backend().await;
    let storage = persisted(EXPIRING_TOKEN);
    let api = client(&base);
    let session = store(api.clone(), storage.clone());
    assert_eq!(session.restore().await.unwrap().await.unwrap(), VerifyOutcome::Confirmed);

    let token = session.token().unwrap();
    let err = api.with_token(&token).list_patients("1").await.unwrap_err();
    assert!(session.on_api_error(&token, &err).await);
    assert_eq!(session.status(), SessionStatus::Unauthenticated);
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get(USER_KEY).unwrap(), None);
}

#[tokio::test]
async fn server_error_from_service_keeps_session() {
    let base = spawn_backend().await;
    let storage = persisted(LIVE_TOKEN);
    let api = client(&base);
    let session = store(api.clone(), storage.clone());
    session.restore().await.unwrap().await.unwrap();

    let err = api.with_token(LIVE_TOKEN).list_appointments().await.unwrap_err();
    assert!(!session.on_api_error(LIVE_TOKEN, &err).await);
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some(LIVE_TOKEN));
}

#[tokio::test]
async fn empty_success_body_is_null() {
    let api = client(&spawn_backend().await);
    let value = api.with_token(LIVE_TOKEN).mark_notification_read("1").await.unwrap();
    assert!(value.is_null());
}

#[tokio::test]
async fn notifications_and_chat_history_unwrap_envelopes() {
    let api = client(&spawn_backend().await);
    let authed = api.with_token(LIVE_TOKEN);

    let inbox = authed.list_notifications().await.unwrap();
    assert_eq!(inbox.len(), 2);
    assert!(!inbox[0].is_read);

    let history = authed.chat_history("42").await.unwrap();
    assert_eq!(history[0].message, "hello 42");
}

#[tokio::test]
async fn upload_sends_multipart_fields() {
    let api = client(&spawn_backend().await);
    let path = std::env::temp_dir().join(format!("careconnect-upload-{}.txt", uuid::Uuid::new_v4()));
    std::fs::write(&path, "lab results").unwrap();

    let echo = api
        .with_token(LIVE_TOKEN)
        .upload_context_file(&path, ContextScope::Local, Some("42"))
        .await
        .unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(echo["file"]["text"], "lab results");
    assert!(echo["file"]["file_name"].as_str().unwrap().starts_with("careconnect-upload-"));
    assert_eq!(echo["type"]["text"], "local");
    assert_eq!(echo["appointmentId"]["text"], "42");
}

#[tokio::test]
async fn upload_missing_file_is_invalid_request() {
    let api = client(&spawn_backend().await);
    let err = api
        .with_token(LIVE_TOKEN)
        .upload_context_file(std::path::Path::new("/definitely/not/here.pdf"), ContextScope::Global, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
}

#[tokio::test]
async fn server_error_with_html_body_uses_status_message() {
    let api = client(&spawn_backend().await);
    let err = api.with_token(LIVE_TOKEN).list_appointments().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(!err.is_connectivity_fault());
    assert_eq!(err.user_message(), "Request failed with status 500");
}

#[tokio::test]
async fn non_json_success_is_decode_error() {
    let api = client(&spawn_backend().await);
    let err = api.with_token(LIVE_TOKEN).list_global_contexts().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}
