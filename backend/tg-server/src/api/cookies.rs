use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, SameSite};

/// HTTP-only cookie carrying the access token.
///
/// Lives exactly as long as the token inside it.
pub fn access_cookie(name: &str, token: &str, max_age: Duration, secure: bool) -> Cookie<'static> {
    let max_age = time::Duration::seconds(i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX));

    Cookie::build((name.to_string(), token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

/// Expired, empty cookie that makes the browser drop the session.
pub fn clear_access_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), String::new()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}
