/// Where the boundary looks for an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// The HTTP-only access-token cookie
    Cookie,
    /// `Authorization: Bearer <token>`
    BearerHeader,
}

/// Sources are tried in this order; the first present value wins.
pub const DEFAULT_CREDENTIAL_SOURCES: [CredentialSource; 2] =
    [CredentialSource::Cookie, CredentialSource::BearerHeader];

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cookie => "cookie",
            Self::BearerHeader => "bearer",
        }
    }
}
