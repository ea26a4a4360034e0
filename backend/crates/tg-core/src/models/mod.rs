pub mod identity_claims;
pub mod rate_window;
pub mod refresh_token;
pub mod role;
pub mod session_lineage;
pub mod token_status;
