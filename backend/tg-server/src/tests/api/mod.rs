mod client_ip;
mod cookies;
mod error;
mod identity_handoff;
