pub mod api;
pub mod app_state;
pub mod error;
pub mod health;
pub mod logger;
pub mod routes;
pub mod sweeper;

#[cfg(test)]
mod tests;

pub use api::{
    cookies::{access_cookie, clear_access_cookie},
    error::ApiError,
    error::Result as ApiResult,
    extractors::authenticated_user::AuthenticatedUser,
    extractors::client_ip::client_key,
    identity_handoff::{HANDOFF_HEADER, IdentityHandoff, SharedSecretHandoff},
};
pub use app_state::{AppState, BoundarySettings};

pub use crate::routes::build_router;
