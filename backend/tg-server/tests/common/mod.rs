#![allow(dead_code)]

//! Test infrastructure for tg-server API tests

use tg_config::{Config, RouteLimit};
use tg_core::{IdentityClaims, Role};
use tg_server::{AppState, HANDOFF_HEADER};
use tg_store::{CasOutcome, CredentialStore, MemoryStore, Result as StoreResult, StoreError, StoredEntry};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-signing-secret-0123456789abcdef";
pub const HANDOFF_SECRET: &str = "integration-handoff-secret-0123456789abcdef";
pub const COOKIE_NAME: &str = "tg_session";

/// Config with test secrets and generous limits
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = JWT_SECRET.into();
    config.auth.handoff_secret = HANDOFF_SECRET.into();
    config.auth.cookie_name = COOKIE_NAME.into();
    config.rate_limit.trust_forwarded_for = true;
    config.rate_limit.session = RouteLimit::new(1_000, 60);
    config.rate_limit.refresh = RouteLimit::new(1_000, 60);
    config.rate_limit.api = RouteLimit::new(1_000, 60);
    config
}

/// Create AppState over a fresh in-memory store
pub fn create_test_app_state() -> AppState {
    create_app_state_with(test_config())
}

pub fn create_app_state_with(config: Config) -> AppState {
    create_app_state_over(config, Arc::new(MemoryStore::new()))
}

pub fn create_app_state_over(config: Config, store: Arc<dyn CredentialStore>) -> AppState {
    AppState::from_config(&config, store).expect("Failed to build app state")
}

/// Credential store whose backend never answers
pub struct UnreachableStore;

impl UnreachableStore {
    fn refuse<T>() -> StoreResult<T> {
        Err(StoreError::unavailable("connection refused"))
    }
}

#[async_trait]
impl CredentialStore for UnreachableStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<StoredEntry>> {
        Self::refuse()
    }

    async fn compare_and_swap(
        &self,
        _key: &str,
        _expected_version: Option<u64>,
        _value: String,
        _expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<CasOutcome> {
        Self::refuse()
    }

    async fn delete(&self, _key: &str) -> StoreResult<bool> {
        Self::refuse()
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> StoreResult<u64> {
        Self::refuse()
    }

    async fn ping(&self) -> StoreResult<()> {
        Self::refuse()
    }

    fn backend_name(&self) -> &'static str {
        "unreachable"
    }
}

pub fn identity(id: &str, role: Role) -> IdentityClaims {
    IdentityClaims::new(id, format!("{id}@test.local"), role, id)
}

pub fn issue_request(identity: &IdentityClaims) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/session")
        .header(header::CONTENT_TYPE, "application/json")
        .header(HANDOFF_HEADER, HANDOFF_SECRET)
        .body(Body::from(serde_json::to_vec(identity).unwrap()))
        .unwrap()
}

pub fn refresh_request(refresh_token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/session/refresh")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "refreshToken": refresh_token }).to_string(),
        ))
        .unwrap()
}

pub fn bearer_get(uri: &str, access_token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Issue a session through the HTTP surface; returns the JSON token pair
pub async fn issue_session(app: &Router, identity: &IdentityClaims) -> serde_json::Value {
    let response = app.clone().oneshot(issue_request(identity)).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await
}

/// `Set-Cookie` header for the session cookie
pub fn session_set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&format!("{COOKIE_NAME}=")))
        .map(str::to_string)
}
