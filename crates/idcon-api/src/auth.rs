use secrecy::SecretString;

/// Domain used when none is configured.
pub const DEFAULT_DOMAIN: &str = "Master";

// ── Protocol headers ─────────────────────────────────────────────────

/// Request header selecting the tenant domain.
pub const DOMAIN_HEADER: &str = "X-Syncope-Domain";
/// Response header carrying the issued access token.
pub const TOKEN_HEADER: &str = "X-Syncope-Token";
/// Response header carrying the token expiry timestamp.
pub const TOKEN_EXPIRE_HEADER: &str = "X-Syncope-Token-Expire";
/// Response header with the caller's entitlements as a JSON map.
pub const ENTITLEMENTS_HEADER: &str = "X-Syncope-Entitlements";
/// Response header with the caller's delegations as a JSON list.
pub const DELEGATIONS_HEADER: &str = "X-Syncope-Delegations";
/// Response header naming the exception type of a failed call.
pub const ERROR_CODE_HEADER: &str = "X-Application-Error-Code";
/// Response header with `Type:message` exception details.
pub const ERROR_INFO_HEADER: &str = "X-Application-Error-Info";

/// Credentials for authenticating with the REST API.
///
/// Each variant carries the secret material needed for its auth flow.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Username/password exchanged for a bearer token at login.
    Password {
        username: String,
        password: SecretString,
    },

    /// A previously issued bearer token (JWT).
    Token { token: SecretString },
}

impl Credentials {
    /// The username, when known before login.
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Password { username, .. } => Some(username),
            Self::Token { .. } => None,
        }
    }
}
