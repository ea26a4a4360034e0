pub mod admin;
pub mod cookies;
pub mod error;
pub mod extractors;
pub mod identity_handoff;
pub mod rate_limit;
pub mod session;
