// ── Runtime connection configuration ──
//
// These types describe *how* to reach the REST API. They carry
// credential data and connection tuning, but never touch disk.
// The CLI/TUI constructs a `ConsoleConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

pub use idcon_api::DEFAULT_DOMAIN;

/// How to authenticate.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Username/password exchanged for a token at connect.
    Password {
        username: String,
        password: SecretString,
    },
    /// Pre-issued bearer token.
    Token(SecretString),
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed test deployments).
    DangerAcceptInvalid,
}

/// Configuration for connecting to one deployment.
///
/// Built by CLI/TUI, passed to `Console` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// REST base URL (e.g. `https://idm.example.com/syncope/rest`).
    pub url: Url,
    /// Tenant domain.
    pub domain: String,
    /// Authentication method and credentials.
    pub auth: AuthCredentials,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl ConsoleConfig {
    pub fn new(url: Url, auth: AuthCredentials) -> Self {
        Self {
            url,
            domain: DEFAULT_DOMAIN.into(),
            auth,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}
