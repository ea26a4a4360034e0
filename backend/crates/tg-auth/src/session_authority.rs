use crate::{
    AccessGrant, AuthError, AuthMetrics, AuthorityConfig, CredentialSource, Result as AuthErrorResult,
    RevocationRetry, RevokeTarget, TokenCodec, TokenPair, refresh_secret, store_keys,
};

use std::future::Future;
use std::panic::Location;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tg_core::{IdentityClaims, RefreshTokenRecord, SessionLineage, TokenStatus};
use tg_store::{
    CasOutcome, CredentialStore, StoreError, Versioned, cas_json, get_json, with_timeout,
};
use uuid::Uuid;

/// Lineages owned by one user, kept for revoke-all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserSessions {
    lineages: Vec<LineageRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LineageRef {
    lineage_id: Uuid,
    retain_until: DateTime<Utc>,
}

/// Issues, rotates, validates and revokes session credentials.
///
/// Holds no authoritative state of its own. Every transition is a
/// compare-and-swap against the credential store, so two processes sharing a
/// store agree on which rotation won.
///
/// Store layout:
/// - `refresh:<digest>` one `RefreshTokenRecord` per refresh token
/// - `lineage:<id>` the `SessionLineage` naming the current head
/// - `user:<id>` the lineages a user has opened
pub struct SessionAuthority {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    config: AuthorityConfig,
    metrics: AuthMetrics,
}

impl SessionAuthority {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        codec: TokenCodec,
        config: AuthorityConfig,
    ) -> AuthErrorResult<Self> {
        config.validate()?;

        Ok(Self {
            store,
            codec,
            config,
            metrics: AuthMetrics::new(),
        })
    }

    pub fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    /// Open a new lineage for a verified identity.
    pub async fn issue(&self, identity: IdentityClaims) -> AuthErrorResult<TokenPair> {
        identity.validate()?;

        let now = Utc::now();
        let secret = refresh_secret::generate();
        let token_hash = refresh_secret::digest(&secret);
        let lineage = SessionLineage::start(identity.clone(), token_hash.clone(), now);
        let record = RefreshTokenRecord::new(
            token_hash.clone(),
            identity.id.clone(),
            lineage.lineage_id,
            now,
            now + self.config.refresh_delta(),
            None,
        );
        let retain_until = self.retain_until(&record);

        // Index first: a dangling ref is skipped by revoke-all, an unindexed
        // lineage could not be revoked by it.
        self.track_lineage(&identity.id, lineage.lineage_id, retain_until)
            .await?;
        self.insert(
            &store_keys::lineage(lineage.lineage_id),
            &lineage,
            retain_until,
            "issue.lineage",
        )
        .await?;
        self.insert(
            &store_keys::refresh(&token_hash),
            &record,
            retain_until,
            "issue.token",
        )
        .await?;

        let pair = self.token_pair(&identity, lineage.lineage_id, secret, record.expires_at)?;

        self.metrics.session_issued();
        log::info!(
            "Issued session {} for user {} ({})",
            lineage.lineage_id,
            identity.id,
            identity.role
        );

        Ok(pair)
    }

    /// Exchange an ACTIVE refresh token for a new pair in the same lineage.
    ///
    /// Presenting a token that was already rotated revokes its whole lineage.
    /// Store failures surface as `StoreUnavailable`; never retry this call
    /// automatically.
    pub async fn rotate(&self, presented: &str) -> AuthErrorResult<TokenPair> {
        let result = self.try_rotate(presented).await;

        match &result {
            Ok(_) => self.metrics.token_rotated(),
            Err(e) => self.metrics.rotation_rejected(e.error_code()),
        }

        result
    }

    async fn try_rotate(&self, presented: &str) -> AuthErrorResult<TokenPair> {
        if !refresh_secret::is_plausible(presented) {
            return Err(refresh_not_found());
        }

        let now = Utc::now();
        let old_hash = refresh_secret::digest(presented);
        let token_key = store_keys::refresh(&old_hash);

        let Some(current) = self
            .load::<RefreshTokenRecord>(&token_key, "rotate.load_token")
            .await?
        else {
            return Err(refresh_not_found());
        };

        match current.value.effective_status(now) {
            TokenStatus::Active => {}
            TokenStatus::Rotated => {
                let lineage_id = current.value.lineage_id;
                if self.rotation_in_flight(lineage_id, &old_hash).await? {
                    // A concurrent rotation retired this token but has not
                    // committed its successor yet. That is a race, not a replay.
                    return Err(refresh_not_active());
                }
                log::warn!(
                    "Refresh token reuse in lineage {} for user {}, revoking lineage",
                    lineage_id,
                    current.value.user_id
                );
                self.metrics.reuse_detected();
                self.revoke_lineage(lineage_id).await?;
                return Err(AuthError::TokenReused {
                    lineage_id,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            TokenStatus::Revoked => return Err(refresh_not_active()),
            TokenStatus::Expired => {
                return Err(AuthError::RefreshExpired {
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        let lineage_key = store_keys::lineage(current.value.lineage_id);
        let Some(mut lineage) = self
            .load::<SessionLineage>(&lineage_key, "rotate.load_lineage")
            .await?
        else {
            return Err(refresh_not_active());
        };
        if lineage.value.revoked || lineage.value.head != old_hash {
            return Err(refresh_not_active());
        }

        // The single linearization point: exactly one caller moves the token
        // out of ACTIVE.
        let mut retired = current.value.clone();
        retired.status = TokenStatus::Rotated;
        let outcome = self
            .cas(
                &token_key,
                Some(current.version),
                &retired,
                current.expires_at,
                "rotate.retire_token",
            )
            .await?;
        if !outcome.is_swapped() {
            log::debug!("Lost rotation race for lineage {}", current.value.lineage_id);
            return Err(refresh_not_active());
        }

        let secret = refresh_secret::generate();
        let new_hash = refresh_secret::digest(&secret);
        let successor = RefreshTokenRecord::new(
            new_hash.clone(),
            current.value.user_id.clone(),
            current.value.lineage_id,
            now,
            now + self.config.refresh_delta(),
            Some(old_hash),
        );
        let retain_until = self.retain_until(&successor);
        let successor_key = store_keys::refresh(&new_hash);
        self.insert(&successor_key, &successor, retain_until, "rotate.insert_token")
            .await?;

        let mut attempts = 0;
        loop {
            attempts += 1;

            if lineage.value.revoked {
                // Revoked between our retire and advance; the successor must not survive.
                self.retire_token(&new_hash, TokenStatus::Revoked).await?;
                return Err(refresh_not_active());
            }

            let mut advanced = lineage.value.clone();
            advanced.advance(new_hash.clone());
            let expires_at = lineage
                .expires_at
                .map_or(retain_until, |existing| existing.max(retain_until));

            match self
                .cas(
                    &lineage_key,
                    Some(lineage.version),
                    &advanced,
                    Some(expires_at),
                    "rotate.advance_lineage",
                )
                .await?
            {
                CasOutcome::Swapped { .. } => break,
                CasOutcome::Conflict if attempts >= self.config.max_cas_attempts => {
                    return Err(contention(&lineage_key, attempts));
                }
                CasOutcome::Conflict => {
                    let Some(reloaded) = self
                        .load::<SessionLineage>(&lineage_key, "rotate.reload_lineage")
                        .await?
                    else {
                        self.retire_token(&new_hash, TokenStatus::Revoked).await?;
                        return Err(refresh_not_active());
                    };
                    lineage = reloaded;
                }
            }
        }

        // Committed; a stale index only shortens how long revoke-all can see the lineage.
        if let Err(e) = self
            .track_lineage(&current.value.user_id, current.value.lineage_id, retain_until)
            .await
        {
            log::warn!(
                "Could not extend session index for user {}: {}",
                current.value.user_id,
                e
            );
        }

        log::debug!(
            "Rotated lineage {} to generation {}",
            current.value.lineage_id,
            lineage.value.generation + 1
        );

        self.token_pair(
            &lineage.value.claims,
            current.value.lineage_id,
            secret,
            successor.expires_at,
        )
    }

    /// True while `token_hash` is retired but still the lineage head.
    async fn rotation_in_flight(&self, lineage_id: Uuid, token_hash: &str) -> AuthErrorResult<bool> {
        let lineage = self
            .load::<SessionLineage>(&store_keys::lineage(lineage_id), "rotate.check_lineage")
            .await?;

        Ok(lineage.is_some_and(|l| !l.value.revoked && l.value.head == token_hash))
    }

    /// Verify an access token. Never touches the store and never fails open:
    /// anything short of a valid signature within its lifetime is `None`.
    pub fn validate(&self, token: Option<&str>) -> Option<AccessGrant> {
        let token = token.map(str::trim).filter(|t| !t.is_empty())?;

        match self.codec.decode(token) {
            Ok(claims) => Some(AccessGrant::from_access_claims(&claims)),
            Err(e) => {
                log::debug!("Rejected access token: {}", e.error_code());
                None
            }
        }
    }

    /// Validate the first credential present among `sources`, in order.
    pub fn validate_source<'a, F>(
        &self,
        sources: &[CredentialSource],
        mut read: F,
    ) -> Option<AccessGrant>
    where
        F: FnMut(CredentialSource) -> Option<&'a str>,
    {
        let token = sources
            .iter()
            .find_map(|source| read(*source).filter(|value| !value.trim().is_empty()));

        self.validate(token)
    }

    /// Revoke the lineage(s) named by `target`. Returns how many lineages this
    /// call revoked; revoking something already revoked or unknown is `Ok(0)`.
    pub async fn revoke(&self, target: RevokeTarget) -> AuthErrorResult<u32> {
        match target {
            RevokeTarget::RefreshToken(secret) => {
                if !refresh_secret::is_plausible(&secret) {
                    return Ok(0);
                }
                let key = store_keys::refresh(&refresh_secret::digest(&secret));
                match self.load::<RefreshTokenRecord>(&key, "revoke.load_token").await? {
                    Some(record) => self.revoke_lineage(record.value.lineage_id).await,
                    None => Ok(0),
                }
            }
            RevokeTarget::Lineage(lineage_id) => self.revoke_lineage(lineage_id).await,
            RevokeTarget::User(user_id) => {
                let key = store_keys::user_sessions(&user_id);
                let Some(sessions) = self.load::<UserSessions>(&key, "revoke.load_user").await?
                else {
                    return Ok(0);
                };

                let mut revoked = 0;
                for lineage in &sessions.value.lineages {
                    revoked += self.revoke_lineage(lineage.lineage_id).await?;
                }

                log::info!("Revoked {} session(s) of user {}", revoked, user_id);
                Ok(revoked)
            }
        }
    }

    /// `revoke`, repeated under `policy` while the store is unavailable.
    pub async fn revoke_with_retry(
        &self,
        target: RevokeTarget,
        policy: &RevocationRetry,
    ) -> AuthErrorResult<u32> {
        let what = match &target {
            RevokeTarget::RefreshToken(_) => "revoke(refresh token)".to_string(),
            RevokeTarget::Lineage(id) => format!("revoke(lineage {id})"),
            RevokeTarget::User(id) => format!("revoke(user {id})"),
        };

        policy.run(&what, || self.revoke(target.clone())).await
    }

    /// Mark the lineage revoked, then retire its head.
    async fn revoke_lineage(&self, lineage_id: Uuid) -> AuthErrorResult<u32> {
        let key = store_keys::lineage(lineage_id);
        let mut attempts = 0;

        let (head, newly_revoked) = loop {
            attempts += 1;

            let Some(current) = self
                .load::<SessionLineage>(&key, "revoke.load_lineage")
                .await?
            else {
                return Ok(0);
            };
            if current.value.revoked {
                break (current.value.head, false);
            }

            let mut revoked = current.value.clone();
            revoked.revoked = true;

            match self
                .cas(
                    &key,
                    Some(current.version),
                    &revoked,
                    current.expires_at,
                    "revoke.mark_lineage",
                )
                .await?
            {
                CasOutcome::Swapped { .. } => break (revoked.head, true),
                CasOutcome::Conflict if attempts >= self.config.max_cas_attempts => {
                    return Err(contention(&key, attempts));
                }
                CasOutcome::Conflict => continue,
            }
        };

        let head_revoked = self.retire_token(&head, TokenStatus::Revoked).await?;

        if newly_revoked {
            self.metrics.lineage_revoked(u32::from(head_revoked));
            log::info!("Revoked session lineage {}", lineage_id);
        }

        Ok(u32::from(newly_revoked))
    }

    /// Move an ACTIVE token to `status`. Returns false when it was already terminal or gone.
    async fn retire_token(&self, token_hash: &str, status: TokenStatus) -> AuthErrorResult<bool> {
        let key = store_keys::refresh(token_hash);
        let mut attempts = 0;

        loop {
            attempts += 1;

            let Some(current) = self
                .load::<RefreshTokenRecord>(&key, "retire.load_token")
                .await?
            else {
                return Ok(false);
            };
            if current.value.status != TokenStatus::Active {
                return Ok(false);
            }

            let mut retired = current.value.clone();
            retired.status = status;

            match self
                .cas(
                    &key,
                    Some(current.version),
                    &retired,
                    current.expires_at,
                    "retire.token",
                )
                .await?
            {
                CasOutcome::Swapped { .. } => return Ok(true),
                CasOutcome::Conflict if attempts >= self.config.max_cas_attempts => {
                    return Err(contention(&key, attempts));
                }
                CasOutcome::Conflict => continue,
            }
        }
    }

    /// Record (or extend) a lineage in the user's index, dropping refs that have aged out.
    async fn track_lineage(
        &self,
        user_id: &str,
        lineage_id: Uuid,
        retain_until: DateTime<Utc>,
    ) -> AuthErrorResult<()> {
        let key = store_keys::user_sessions(user_id);
        let mut attempts = 0;

        loop {
            attempts += 1;
            let now = Utc::now();

            let current = self
                .load::<UserSessions>(&key, "index.load_user")
                .await?;
            let (mut sessions, version) = match current {
                Some(found) => (found.value, Some(found.version)),
                None => (UserSessions::default(), None),
            };

            sessions.lineages.retain(|r| r.retain_until > now);
            match sessions
                .lineages
                .iter_mut()
                .find(|r| r.lineage_id == lineage_id)
            {
                Some(existing) => {
                    existing.retain_until = existing.retain_until.max(retain_until);
                }
                None => sessions.lineages.push(LineageRef {
                    lineage_id,
                    retain_until,
                }),
            }

            let expires_at = sessions.lineages.iter().map(|r| r.retain_until).max();

            match self
                .cas(&key, version, &sessions, expires_at, "index.update_user")
                .await?
            {
                CasOutcome::Swapped { .. } => return Ok(()),
                CasOutcome::Conflict if attempts >= self.config.max_cas_attempts => {
                    return Err(contention(&key, attempts));
                }
                CasOutcome::Conflict => continue,
            }
        }
    }

    fn token_pair(
        &self,
        identity: &IdentityClaims,
        lineage_id: Uuid,
        refresh_token: String,
        refresh_expires_at: DateTime<Utc>,
    ) -> AuthErrorResult<TokenPair> {
        let access = self
            .codec
            .encode(identity, lineage_id, self.config.access_ttl)?;

        Ok(TokenPair {
            access_token: access.token,
            refresh_token,
            expires_at: access.expires_at,
            refresh_expires_at,
            lineage_id,
        })
    }

    /// Records outlive their own expiry by one access TTL so a late replay
    /// still reads as ROTATED rather than unknown.
    fn retain_until(&self, record: &RefreshTokenRecord) -> DateTime<Utc> {
        record.expires_at + self.config.access_delta()
    }

    // Store helpers capture the caller's location before building their future.

    #[track_caller]
    fn insert<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        expires_at: DateTime<Utc>,
        operation: &'static str,
    ) -> impl Future<Output = AuthErrorResult<()>> {
        let location = ErrorLocation::from(Location::caller());
        let pending = self.cas(key, None, value, Some(expires_at), operation);

        async move {
            match pending.await? {
                CasOutcome::Swapped { .. } => Ok(()),
                CasOutcome::Conflict => Err(AuthError::Internal {
                    message: format!("fresh key '{key}' already exists"),
                    location,
                }),
            }
        }
    }

    #[track_caller]
    fn load<T: DeserializeOwned>(
        &self,
        key: &str,
        operation: &'static str,
    ) -> impl Future<Output = AuthErrorResult<Option<Versioned<T>>>> {
        let location = ErrorLocation::from(Location::caller());
        let pending = with_timeout(
            self.config.store_timeout,
            operation,
            get_json(self.store.as_ref(), key),
        );

        async move {
            pending
                .await
                .map_err(|source| self.store_failure(operation, source, location))
        }
    }

    #[track_caller]
    fn cas<T: Serialize + Sync>(
        &self,
        key: &str,
        expected_version: Option<u64>,
        value: &T,
        expires_at: Option<DateTime<Utc>>,
        operation: &'static str,
    ) -> impl Future<Output = AuthErrorResult<CasOutcome>> {
        let location = ErrorLocation::from(Location::caller());
        let pending = with_timeout(
            self.config.store_timeout,
            operation,
            cas_json(self.store.as_ref(), key, expected_version, value, expires_at),
        );

        async move {
            pending
                .await
                .map_err(|source| self.store_failure(operation, source, location))
        }
    }

    fn store_failure(
        &self,
        operation: &'static str,
        source: StoreError,
        location: ErrorLocation,
    ) -> AuthError {
        self.metrics.store_error(operation);
        AuthError::StoreUnavailable { source, location }
    }
}

#[track_caller]
fn refresh_not_found() -> AuthError {
    AuthError::RefreshNotFound {
        location: ErrorLocation::from(Location::caller()),
    }
}

#[track_caller]
fn refresh_not_active() -> AuthError {
    AuthError::RefreshNotActive {
        location: ErrorLocation::from(Location::caller()),
    }
}

#[track_caller]
pub(crate) fn contention(key: &str, attempts: u32) -> AuthError {
    AuthError::StoreContention {
        key: key.to_string(),
        attempts,
        location: ErrorLocation::from(Location::caller()),
    }
}
