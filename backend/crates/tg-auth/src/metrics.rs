use metrics::counter;

/// Counters for credential and admission events
#[derive(Clone)]
pub struct AuthMetrics {
    prefix: &'static str,
}

impl AuthMetrics {
    pub fn new() -> Self {
        Self { prefix: "tg_auth" }
    }

    pub fn session_issued(&self) {
        counter!(format!("{}.sessions.issued", self.prefix)).increment(1);
    }

    pub fn token_rotated(&self) {
        counter!(format!("{}.tokens.rotated", self.prefix)).increment(1);
    }

    /// Rotation refused; `reason` is the error code
    pub fn rotation_rejected(&self, reason: &str) {
        counter!(format!("{}.tokens.rejected", self.prefix)).increment(1);
        counter!(format!("{}.tokens.rejected.{}", self.prefix, reason)).increment(1);
    }

    pub fn reuse_detected(&self) {
        counter!(format!("{}.tokens.reuse_detected", self.prefix)).increment(1);
    }

    pub fn lineage_revoked(&self, tokens: u32) {
        counter!(format!("{}.lineages.revoked", self.prefix)).increment(1);
        counter!(format!("{}.tokens.revoked", self.prefix)).increment(tokens as u64);
    }

    pub fn request_admitted(&self) {
        counter!(format!("{}.admission.allowed", self.prefix)).increment(1);
    }

    pub fn request_limited(&self) {
        counter!(format!("{}.admission.limited", self.prefix)).increment(1);
    }

    pub fn store_error(&self, operation: &str) {
        counter!(format!("{}.store.errors", self.prefix)).increment(1);
        counter!(format!("{}.store.errors.{}", self.prefix, operation)).increment(1);
    }
}

impl Default for AuthMetrics {
    fn default() -> Self {
        Self::new()
    }
}
