use crate::{AccessClaims, AuthError, Result as AuthErrorResult};

use std::panic::Location;

use chrono::{DateTime, TimeZone, Utc};
use error_location::ErrorLocation;
use tg_core::{IdentityClaims, Role};
use uuid::Uuid;

/// The validated, trusted context after access-token verification.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessGrant {
    pub claims: IdentityClaims,
    pub lineage_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl AccessGrant {
    pub fn from_access_claims(claims: &AccessClaims) -> Self {
        Self {
            claims: claims.identity(),
            lineage_id: claims.sid,
            expires_at: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .unwrap_or_else(Utc::now),
        }
    }

    /// Fail with `Forbidden` unless the holder's role satisfies `required`.
    #[track_caller]
    pub fn require(&self, required: Role) -> AuthErrorResult<()> {
        if self.claims.role.satisfies(required) {
            return Ok(());
        }

        Err(AuthError::Forbidden {
            required,
            actual: self.claims.role,
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
