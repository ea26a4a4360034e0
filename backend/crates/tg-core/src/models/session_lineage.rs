use crate::IdentityClaims;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// All refresh tokens ever derived from a single login.
///
/// `head` names the digest of the one token that may still be ACTIVE. Once
/// `revoked` is set the lineage is dead: no member may rotate again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionLineage {
    pub lineage_id: Uuid,
    pub user_id: String,
    pub claims: IdentityClaims,
    pub head: String,
    pub generation: u32,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl SessionLineage {
    pub fn start(claims: IdentityClaims, head: String, created_at: DateTime<Utc>) -> Self {
        Self {
            lineage_id: Uuid::new_v4(),
            user_id: claims.id.clone(),
            claims,
            head,
            generation: 0,
            revoked: false,
            created_at,
        }
    }

    pub fn advance(&mut self, new_head: String) {
        self.head = new_head;
        self.generation += 1;
    }
}
