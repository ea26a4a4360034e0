pub mod error;
pub mod models;

pub use error::{CoreError, Result as CoreResult};
pub use models::identity_claims::IdentityClaims;
pub use models::rate_window::RateWindow;
pub use models::refresh_token::RefreshTokenRecord;
pub use models::role::Role;
pub use models::session_lineage::SessionLineage;
pub use models::token_status::TokenStatus;
