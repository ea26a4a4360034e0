use super::{TEST_SECRET, cliente};
use crate::{AuthError, TOKEN_ISSUER, TokenCodec};

use std::time::Duration;

use tg_core::Role;
use uuid::Uuid;

#[test]
fn given_valid_token_when_decoded_then_returns_claims() {
    let codec = TokenCodec::new(TEST_SECRET, 0).unwrap();
    let lineage_id = Uuid::new_v4();

    let encoded = codec
        .encode(&cliente("u1"), lineage_id, Duration::from_secs(900))
        .unwrap();
    let claims = codec.decode(&encoded.token).unwrap();

    assert_eq!(claims.sub, "u1");
    assert_eq!(claims.role, Role::Cliente);
    assert_eq!(claims.sid, lineage_id);
    assert_eq!(claims.iss, TOKEN_ISSUER);
    assert_eq!(claims.exp - claims.iat, 900);
    assert_eq!(claims.identity(), cliente("u1"));
}

#[tokio::test]
async fn given_one_second_ttl_when_decoded_after_two_seconds_then_token_expired() {
    let codec = TokenCodec::new(TEST_SECRET, 0).unwrap();
    let encoded = codec
        .encode(&cliente("u1"), Uuid::new_v4(), Duration::from_secs(1))
        .unwrap();

    tokio::time::sleep(Duration::from_secs(2)).await;

    let result = codec.decode(&encoded.token);
    assert!(matches!(result, Err(AuthError::TokenExpired { .. })));
}

#[test]
fn given_wrong_secret_when_decoded_then_invalid_signature() {
    let issuer = TokenCodec::new(TEST_SECRET, 0).unwrap();
    let verifier = TokenCodec::new(b"another-secret-key-at-least-32-bytes", 0).unwrap();
    let encoded = issuer
        .encode(&cliente("u1"), Uuid::new_v4(), Duration::from_secs(900))
        .unwrap();

    let result = verifier.decode(&encoded.token);

    assert!(matches!(result, Err(AuthError::InvalidSignature { .. })));
}

#[test]
fn given_tampered_payload_when_decoded_then_rejected() {
    let codec = TokenCodec::new(TEST_SECRET, 0).unwrap();
    let encoded = codec
        .encode(&cliente("u1"), Uuid::new_v4(), Duration::from_secs(900))
        .unwrap();
    let admin = codec
        .encode(
            &tg_core::IdentityClaims::new("u1", "", Role::Admin, ""),
            Uuid::new_v4(),
            Duration::from_secs(900),
        )
        .unwrap();

    // Splice the admin payload onto the cliente signature
    let parts: Vec<&str> = encoded.token.split('.').collect();
    let admin_parts: Vec<&str> = admin.token.split('.').collect();
    let forged = format!("{}.{}.{}", parts[0], admin_parts[1], parts[2]);

    let result = codec.decode(&forged);

    assert!(matches!(result, Err(AuthError::InvalidSignature { .. })));
}

#[test]
fn given_garbage_when_decoded_then_malformed() {
    let codec = TokenCodec::new(TEST_SECRET, 0).unwrap();

    for token in ["", "not-a-jwt", "a.b.c"] {
        let result = codec.decode(token);
        assert!(
            matches!(result, Err(AuthError::MalformedToken { .. })),
            "expected malformed for {token:?}"
        );
    }
}

#[test]
fn given_empty_secret_when_codec_created_then_configuration_error() {
    assert!(matches!(
        TokenCodec::new(b"", 0),
        Err(AuthError::Configuration { .. })
    ));
    assert!(matches!(
        TokenCodec::new(b"   ", 0),
        Err(AuthError::Configuration { .. })
    ));
}
