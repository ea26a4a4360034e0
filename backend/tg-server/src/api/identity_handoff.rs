//! Trust boundary between the identity provider and this service.
//!
//! Identity is established elsewhere (password login, OAuth, ...). The
//! provider hands the verified claims to `POST /api/v1/session` and proves it is
//! the provider by presenting a shared secret.

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

pub const HANDOFF_HEADER: &str = "x-handoff-secret";

/// Decides whether a request really comes from the identity provider.
pub trait IdentityHandoff: Send + Sync {
    fn verify(&self, headers: &HeaderMap) -> bool;
}

/// Shared-secret hand-off via the `X-Handoff-Secret` header.
pub struct SharedSecretHandoff {
    secret: Vec<u8>,
}

impl SharedSecretHandoff {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }
}

impl IdentityHandoff for SharedSecretHandoff {
    fn verify(&self, headers: &HeaderMap) -> bool {
        let Some(presented) = headers.get(HANDOFF_HEADER) else {
            return false;
        };
        if self.secret.is_empty() {
            return false;
        }

        // Length leaks, content does not
        presented.as_bytes().ct_eq(&self.secret).into()
    }
}
