use crate::{CoreError, CoreResult};

use std::fmt;
use std::panic::Location;
use std::str::FromStr;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// Privilege tiers recognised by the platform.
///
/// Ordering matters: `Cliente < Vendedor < Admin`. Any value outside this set is
/// rejected at the boundary, both by `FromStr` and by serde.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Cliente,
    Vendedor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cliente => "CLIENTE",
            Self::Vendedor => "VENDEDOR",
            Self::Admin => "ADMIN",
        }
    }

    /// Whether this role may perform an action that requires `required`.
    pub fn satisfies(&self, required: Role) -> bool {
        *self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    #[track_caller]
    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "CLIENTE" => Ok(Self::Cliente),
            "VENDEDOR" => Ok(Self::Vendedor),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(CoreError::InvalidRole {
                value: s.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
