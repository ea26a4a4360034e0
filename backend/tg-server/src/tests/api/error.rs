use crate::ApiError;
use crate::api::error::UNAUTHENTICATED_MESSAGE;

use std::panic::Location;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use error_location::ErrorLocation;
use http_body_util::BodyExt;
use tg_auth::AuthError;
use tg_core::Role;
use tg_store::StoreError;
use uuid::Uuid;

async fn body_json(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn here() -> ErrorLocation {
    ErrorLocation::from(Location::caller())
}

#[tokio::test]
async fn test_unauthenticated_returns_401_without_reason() {
    let error = ApiError::unauthenticated("refresh token reuse in lineage 42");
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "UNAUTHENTICATED");
    assert_eq!(json["error"]["message"], UNAUTHENTICATED_MESSAGE);
    assert!(!json.to_string().contains("lineage"));
}

#[tokio::test]
async fn test_rotation_failures_are_indistinguishable() {
    let failures = vec![
        AuthError::RefreshNotFound { location: here() },
        AuthError::RefreshNotActive { location: here() },
        AuthError::RefreshExpired { location: here() },
        AuthError::TokenReused {
            lineage_id: Uuid::new_v4(),
            location: here(),
        },
    ];

    let mut bodies = Vec::new();
    for failure in failures {
        let response = ApiError::from(failure).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        bodies.push(body_json(response).await);
    }

    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn test_forbidden_returns_403() {
    let error = ApiError::from(AuthError::Forbidden {
        required: Role::Admin,
        actual: Role::Cliente,
        location: here(),
    });
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_rate_limited_returns_429_with_headers() {
    let error = ApiError::RateLimited {
        limit: 5,
        retry_after_secs: 42,
        location: here(),
    };
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    assert_eq!(response.headers()["x-ratelimit-limit"], "5");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "RATE_LIMITED");
    assert_eq!(json["error"]["retryAfter"], 42);
}

#[tokio::test]
async fn test_store_unavailable_returns_503_with_retry_after() {
    let error = ApiError::from(AuthError::from(StoreError::unavailable("connection refused")));
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()[header::RETRY_AFTER], "1");

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "STORE_UNAVAILABLE");
    assert!(!json.to_string().contains("connection refused"));
}

#[tokio::test]
async fn test_store_contention_maps_to_503() {
    let error = ApiError::from(AuthError::StoreContention {
        key: "lineage:1".into(),
        attempts: 8,
        location: here(),
    });

    assert_eq!(error.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_invalid_claims_returns_400_with_message() {
    let error = ApiError::from(AuthError::InvalidClaims {
        message: "id cannot be empty".into(),
        location: here(),
    });
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
    assert_eq!(json["error"]["message"], "id cannot be empty");
}

#[tokio::test]
async fn test_configuration_error_returns_500_without_details() {
    let error = ApiError::from(AuthError::configuration("signing secret is empty"));
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
    assert!(!json.to_string().contains("secret"));
}

#[test]
fn test_rate_limit_exceeded_converts_with_retry_hint() {
    let error = ApiError::from(AuthError::RateLimitExceeded {
        limit: 10,
        window_secs: 60,
        reset_at: chrono::Utc::now() + chrono::TimeDelta::seconds(30),
        location: here(),
    });

    match error {
        ApiError::RateLimited {
            limit,
            retry_after_secs,
            ..
        } => {
            assert_eq!(limit, 10);
            assert!((29..=30).contains(&retry_after_secs));
        }
        other => panic!("Expected RateLimited, got {other:?}"),
    }
}
