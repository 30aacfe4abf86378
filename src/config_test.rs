use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| map.get(key).cloned()
}

// =============================================================================
// from_lookup
// =============================================================================

#[test]
fn from_lookup_defaults() {
    let cfg = Config::from_lookup(lookup_from(&[("HOME", "/home/doc")])).unwrap();
    assert_eq!(cfg.api_url, DEFAULT_API_URL);
    assert_eq!(cfg.timeouts, Timeouts::default());
    assert_eq!(cfg.state_dir, PathBuf::from("/home/doc/.careconnect"));
}

#[test]
fn from_lookup_without_home_uses_relative_dir() {
    let cfg = Config::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(cfg.state_dir, PathBuf::from(".careconnect"));
}

#[test]
fn from_lookup_overrides() {
    let cfg = Config::from_lookup(lookup_from(&[
        (ENV_API_URL, "https://clinic.example.com/api/"),
        (ENV_REQUEST_TIMEOUT_SECS, "30"),
        (ENV_CONNECT_TIMEOUT_SECS, " 2 "),
        (ENV_STATE_DIR, "/var/lib/careconnect"),
    ]))
    .unwrap();
    assert_eq!(cfg.api_url, "https://clinic.example.com/api");
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 30, connect_secs: 2 });
    assert_eq!(cfg.timeouts.request(), Duration::from_secs(30));
    assert_eq!(cfg.state_dir, PathBuf::from("/var/lib/careconnect"));
}

#[test]
fn from_lookup_rejects_bad_timeout() {
    let err = Config::from_lookup(lookup_from(&[(ENV_REQUEST_TIMEOUT_SECS, "soon")])).unwrap_err();
    assert_eq!(err, ConfigError::InvalidNumber { var: ENV_REQUEST_TIMEOUT_SECS, value: "soon".into() });
}

#[test]
fn from_lookup_rejects_zero_timeout() {
    assert!(Config::from_lookup(lookup_from(&[(ENV_CONNECT_TIMEOUT_SECS, "0")])).is_err());
}

#[test]
fn from_lookup_rejects_non_http_url() {
    let err = Config::from_lookup(lookup_from(&[(ENV_API_URL, "ftp://files")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidUrl { .. }));
}

// =============================================================================
// helpers
// =============================================================================

#[test]
fn parse_api_url_blank_falls_back() {
    assert_eq!(parse_api_url(Some("   ".into())).unwrap(), DEFAULT_API_URL);
}

#[test]
fn parse_secs_absent_uses_default() {
    assert_eq!(parse_secs("X", None, 7).unwrap(), 7);
}
