use crate::TokenStatus;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted state of one refresh token.
///
/// Only the SHA-256 digest of the secret is kept; the secret itself is handed
/// to the client once and never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub user_id: String,
    pub lineage_id: Uuid,
    pub status: TokenStatus,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Digest of the predecessor in the lineage, `None` for the first token.
    pub rotated_from: Option<String>,
}

impl RefreshTokenRecord {
    pub fn new(
        token_hash: String,
        user_id: String,
        lineage_id: Uuid,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        rotated_from: Option<String>,
    ) -> Self {
        Self {
            token_hash,
            user_id,
            lineage_id,
            status: TokenStatus::Active,
            issued_at,
            expires_at,
            rotated_from,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Status as observed at `now`. An ACTIVE token past its expiry reads as EXPIRED.
    pub fn effective_status(&self, now: DateTime<Utc>) -> TokenStatus {
        match self.status {
            TokenStatus::Active if self.is_expired_at(now) => TokenStatus::Expired,
            status => status,
        }
    }
}
