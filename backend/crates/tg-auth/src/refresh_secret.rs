//! Refresh-token secrets: generation and the digest used as the store key.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// 256 bits of entropy per refresh token.
pub const REFRESH_SECRET_BYTES: usize = 32;

/// Anything longer cannot have come from `generate`.
pub const MAX_REFRESH_TOKEN_LENGTH: usize = 128;

pub fn generate() -> String {
    let mut bytes = [0u8; REFRESH_SECRET_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn digest(secret: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(secret.as_bytes()))
}

/// Cheap shape check before touching the store.
pub fn is_plausible(secret: &str) -> bool {
    !secret.is_empty()
        && secret.len() <= MAX_REFRESH_TOKEN_LENGTH
        && secret
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
