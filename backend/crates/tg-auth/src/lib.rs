pub mod access_claims;
pub mod access_grant;
pub mod admission_rate_limiter;
pub mod authority_config;
pub mod credential_source;
pub mod error;
pub mod metrics;
pub mod rate_decision;
pub mod refresh_secret;
pub mod revocation_retry;
pub mod revoke_target;
pub mod session_authority;
pub mod token_codec;
pub mod token_pair;

mod store_keys;

pub use access_claims::AccessClaims;
pub use access_grant::AccessGrant;
pub use admission_rate_limiter::AdmissionRateLimiter;
pub use authority_config::AuthorityConfig;
pub use credential_source::{CredentialSource, DEFAULT_CREDENTIAL_SOURCES};
pub use error::{AuthError, AuthErrorKind, Result};
pub use metrics::AuthMetrics;
pub use rate_decision::RateDecision;
pub use revocation_retry::RevocationRetry;
pub use revoke_target::RevokeTarget;
pub use session_authority::SessionAuthority;
pub use token_codec::{EncodedAccessToken, TOKEN_ISSUER, TokenCodec};
pub use token_pair::TokenPair;

#[cfg(test)]
mod tests;
