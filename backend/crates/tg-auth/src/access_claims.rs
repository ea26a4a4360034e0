use crate::{AuthError, Result as AuthErrorResult};

use std::panic::Location;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tg_core::{IdentityClaims, Role};
use uuid::Uuid;

/// JWT payload of an access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessClaims {
    /// Subject (user id)
    pub sub: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Session lineage the token was minted for
    pub sid: Uuid,
    pub iss: String,
    /// Issued at timestamp (Unix)
    pub iat: i64,
    /// Expiration timestamp (Unix)
    pub exp: i64,
}

impl AccessClaims {
    pub fn new(identity: &IdentityClaims, sid: Uuid, iss: &str, iat: i64, exp: i64) -> Self {
        Self {
            sub: identity.id.clone(),
            email: identity.email.clone(),
            role: identity.role,
            name: identity.display_name.clone(),
            sid,
            iss: iss.to_string(),
            iat,
            exp,
        }
    }

    pub fn identity(&self) -> IdentityClaims {
        IdentityClaims {
            id: self.sub.clone(),
            email: self.email.clone(),
            role: self.role,
            display_name: self.name.clone(),
        }
    }

    /// Validate claims after JWT signature verification
    #[track_caller]
    pub fn validate(&self) -> AuthErrorResult<()> {
        if self.sub.is_empty() {
            return Err(AuthError::MalformedToken {
                message: "sub (user_id) cannot be empty".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if self.exp <= self.iat {
            return Err(AuthError::MalformedToken {
                message: "exp must be after iat".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(())
    }
}
