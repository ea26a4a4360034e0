pub mod authenticated_user;
pub mod client_ip;
