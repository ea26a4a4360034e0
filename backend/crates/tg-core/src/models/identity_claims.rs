use crate::{CoreError, CoreResult, Role};

use std::panic::Location;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

pub const MAX_ID_LENGTH: usize = 128;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_DISPLAY_NAME_LENGTH: usize = 256;

/// Verified identity handed over by the identity provider.
///
/// Produced once per login and carried verbatim inside access tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaims {
    pub id: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub display_name: String,
}

impl IdentityClaims {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role,
            display_name: display_name.into(),
        }
    }

    #[track_caller]
    pub fn validate(&self) -> CoreResult<()> {
        if self.id.trim().is_empty() {
            return Err(Self::invalid("id cannot be empty"));
        }
        if self.id.len() > MAX_ID_LENGTH {
            return Err(Self::invalid("id exceeds maximum length"));
        }
        if self.email.len() > MAX_EMAIL_LENGTH {
            return Err(Self::invalid("email exceeds maximum length"));
        }
        if self.display_name.len() > MAX_DISPLAY_NAME_LENGTH {
            return Err(Self::invalid("displayName exceeds maximum length"));
        }

        Ok(())
    }

    #[track_caller]
    fn invalid(message: &str) -> CoreError {
        CoreError::Validation {
            message: message.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
