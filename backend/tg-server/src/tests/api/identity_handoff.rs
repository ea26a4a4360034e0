use crate::{HANDOFF_HEADER, IdentityHandoff, SharedSecretHandoff};

use axum::http::{HeaderMap, HeaderValue};

const SECRET: &str = "handoff-secret-for-unit-tests-0123456789";

fn headers_with(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(HANDOFF_HEADER, HeaderValue::from_static(value));
    headers
}

#[test]
fn test_matching_secret_is_accepted() {
    let handoff = SharedSecretHandoff::new(SECRET);

    assert!(handoff.verify(&headers_with("handoff-secret-for-unit-tests-0123456789")));
}

#[test]
fn test_wrong_or_truncated_secret_is_rejected() {
    let handoff = SharedSecretHandoff::new(SECRET);

    assert!(!handoff.verify(&headers_with("handoff-secret-for-unit-tests-0123456788")));
    assert!(!handoff.verify(&headers_with("handoff-secret")));
}

#[test]
fn test_missing_header_is_rejected() {
    let handoff = SharedSecretHandoff::new(SECRET);

    assert!(!handoff.verify(&HeaderMap::new()));
}

#[test]
fn test_empty_configured_secret_rejects_everything() {
    let handoff = SharedSecretHandoff::new("");

    assert!(!handoff.verify(&headers_with("")));
}
