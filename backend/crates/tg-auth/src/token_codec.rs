use crate::{AccessClaims, AuthError, Result as AuthErrorResult};

use std::panic::Location;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use error_location::ErrorLocation;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tg_core::IdentityClaims;
use uuid::Uuid;

pub const TOKEN_ISSUER: &str = "tollgate";

/// A freshly signed access token and its validity bounds.
#[derive(Debug, Clone)]
pub struct EncodedAccessToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies HS256 access tokens.
///
/// HMAC comparison inside `jsonwebtoken` is constant time. Expiry is checked
/// with zero tolerance unless a leeway is configured.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    #[track_caller]
    pub fn new(secret: &[u8], leeway_secs: u64) -> AuthErrorResult<Self> {
        if secret.iter().all(u8::is_ascii_whitespace) {
            return Err(AuthError::Configuration {
                message: "signing secret is empty".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = leeway_secs;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Sign an access token for `identity` that lives for `ttl`.
    #[track_caller]
    pub fn encode(
        &self,
        identity: &IdentityClaims,
        lineage_id: Uuid,
        ttl: Duration,
    ) -> AuthErrorResult<EncodedAccessToken> {
        let iat = Utc::now().timestamp();
        let exp = iat + ttl.as_secs().max(1) as i64;
        let claims = AccessClaims::new(identity, lineage_id, TOKEN_ISSUER, iat, exp);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(
            |e| AuthError::Internal {
                message: format!("failed to sign access token: {e}"),
                location: ErrorLocation::from(Location::caller()),
            },
        )?;

        Ok(EncodedAccessToken {
            token,
            issued_at: timestamp(iat),
            expires_at: timestamp(exp),
        })
    }

    /// Verify signature and expiry, then return the embedded claims.
    #[track_caller]
    pub fn decode(&self, token: &str) -> AuthErrorResult<AccessClaims> {
        let token_data =
            decode::<AccessClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired {
                        location: ErrorLocation::from(Location::caller()),
                    },
                    ErrorKind::InvalidSignature => AuthError::InvalidSignature {
                        location: ErrorLocation::from(Location::caller()),
                    },
                    _ => AuthError::MalformedToken {
                        message: e.to_string(),
                        location: ErrorLocation::from(Location::caller()),
                    },
                }
            })?;

        token_data.claims.validate()?;

        Ok(token_data.claims)
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}
