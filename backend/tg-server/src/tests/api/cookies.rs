use crate::{access_cookie, clear_access_cookie};

use std::time::Duration;

use axum_extra::extract::cookie::SameSite;

#[test]
fn test_access_cookie_attributes() {
    let cookie = access_cookie("tg_session", "token-value", Duration::from_secs(900), true);

    assert_eq!(cookie.name(), "tg_session");
    assert_eq!(cookie.value(), "token-value");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.max_age(), Some(time::Duration::seconds(900)));
}

#[test]
fn test_access_cookie_not_secure_outside_production() {
    let cookie = access_cookie("tg_session", "token-value", Duration::from_secs(900), false);

    assert_eq!(cookie.secure(), Some(false));
}

#[test]
fn test_clear_cookie_expires_immediately() {
    let cookie = clear_access_cookie("tg_session", true);

    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    assert_eq!(cookie.path(), Some("/"));
}
