use crate::{ApiResult, AppState, AuthenticatedUser};

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tg_auth::RevokeTarget;
use tg_core::Role;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeUserResponse {
    pub user_id: String,
    pub revoked: u32,
}

/// POST /api/v1/admin/users/{user_id}/revoke
///
/// Revokes every lineage the user holds. Access tokens already issued stay
/// valid until they expire.
pub async fn revoke_user(
    State(state): State<AppState>,
    AuthenticatedUser(grant): AuthenticatedUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<RevokeUserResponse>> {
    grant.require(Role::Admin)?;

    let revoked = state
        .authority
        .revoke_with_retry(
            RevokeTarget::User(user_id.clone()),
            &state.settings.revocation_retry,
        )
        .await?;

    log::info!(
        "Admin {} revoked {} session(s) of user {}",
        grant.claims.id,
        revoked,
        user_id
    );

    Ok(Json(RevokeUserResponse { user_id, revoked }))
}
