use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevokeTarget {
    /// The lineage holding this refresh token (logout with a refresh token)
    RefreshToken(String),
    /// A lineage by id (logout with an access token)
    Lineage(Uuid),
    /// Every lineage of a user (administrative action)
    User(String),
}
