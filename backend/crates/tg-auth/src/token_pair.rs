use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Result of `issue` and `rotate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    #[serde(skip)]
    pub lineage_id: Uuid,
}
