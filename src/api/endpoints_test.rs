use reqwest::Method;

use super::*;
use crate::api::ApiClient;
use crate::config::Timeouts;

#[test]
fn plain_ids_pass_through() {
    assert_eq!(patient("42").unwrap(), "/patients/42");
    assert_eq!(notification_read("n-7").unwrap(), "/notifications/n-7/read");
    assert_eq!(chat_history("appt_1.v2~x").unwrap(), "/chats/appt_1.v2~x/history");
}

#[test]
fn reserved_characters_are_escaped() {
    assert_eq!(patient("../users").unwrap(), "/patients/..%2Fusers");
    assert_eq!(notification_read("1/../../clear-all?x=").unwrap(), "/notifications/1%2F..%2F..%2Fclear-all%3Fx%3D/read");
    assert_eq!(appointment("a#b c%").unwrap(), "/appointments/a%23b%20c%25");
    assert_eq!(segment("Jürgen").unwrap(), "J%C3%BCrgen");
}

#[test]
fn dot_and_empty_ids_are_rejected() {
    for id in ["", ".", ".."] {
        assert!(matches!(patient(id), Err(ApiError::InvalidRequest(_))), "{id:?}");
    }
    // Dots inside a longer id are ordinary characters.
    assert_eq!(segment("...").unwrap(), "...");
}

#[test]
fn escaped_id_stays_inside_its_segment() {
    let client = ApiClient::new("http://127.0.0.1:8000/api", Timeouts::default()).unwrap();

    let request = client.request(Method::DELETE, &patient("../users").unwrap(), None).build().unwrap();
    assert_eq!(request.url().path(), "/api/patients/..%2Fusers");

    let request = client
        .request(Method::PATCH, &notification_read("1/../../clear-all?x=").unwrap(), None)
        .build()
        .unwrap();
    assert_eq!(request.url().path(), "/api/notifications/1%2F..%2F..%2Fclear-all%3Fx%3D/read");
    assert_eq!(request.url().query(), None);
}
