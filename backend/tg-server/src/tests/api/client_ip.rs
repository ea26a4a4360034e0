use crate::client_key;

use std::net::SocketAddr;

use axum::{
    extract::ConnectInfo,
    http::{Extensions, HeaderMap, HeaderValue},
};

fn peer(addr: &str) -> Extensions {
    let mut extensions = Extensions::new();
    extensions.insert(ConnectInfo(addr.parse::<SocketAddr>().unwrap()));
    extensions
}

fn forwarded(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-forwarded-for", HeaderValue::from_static(value));
    headers
}

#[test]
fn test_peer_address_is_used_by_default() {
    let key = client_key(&HeaderMap::new(), &peer("10.1.2.3:55000"), false);

    assert_eq!(key, "10.1.2.3");
}

#[test]
fn test_forwarded_for_is_ignored_unless_trusted() {
    let key = client_key(&forwarded("203.0.113.7"), &peer("10.1.2.3:55000"), false);

    assert_eq!(key, "10.1.2.3");
}

#[test]
fn test_trusted_forwarded_for_uses_first_hop() {
    let key = client_key(
        &forwarded(" 203.0.113.7 , 10.0.0.1"),
        &peer("10.1.2.3:55000"),
        true,
    );

    assert_eq!(key, "203.0.113.7");
}

#[test]
fn test_empty_forwarded_for_falls_back_to_peer() {
    let key = client_key(&forwarded(""), &peer("[::1]:55000"), true);

    assert_eq!(key, "::1");
}

#[test]
fn test_no_peer_and_no_header_share_one_bucket() {
    let key = client_key(&HeaderMap::new(), &Extensions::new(), true);

    assert_eq!(key, "unknown");
}
