use std::fmt;

use thiserror::Error;

/// A single typed failure reported by the server.
///
/// The server tags validation and business-rule failures with a type name
/// (e.g. `InvalidUser`, `DataIntegrityViolation`) and a list of element
/// messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientException {
    /// HTTP status the exception was returned with.
    pub status: u16,
    /// Exception type name, as sent in `X-Application-Error-Code`.
    pub kind: String,
    /// Element messages, as sent in `X-Application-Error-Info`.
    pub elements: Vec<String>,
}

impl fmt::Display for ClientException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.elements.join(", "))
    }
}

/// Top-level error type for the `idcon-api` crate.
///
/// Covers authentication, transport and server-side failures.
/// `idcon-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, unknown domain, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// HTTP 401 on an authenticated call (token expired or revoked).
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// HTTP 403: the caller lacks the entitlement for the operation.
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// A header value could not be encoded or decoded.
    #[error("Invalid header {name}: {message}")]
    InvalidHeader { name: &'static str, message: String },

    // ── Server ──────────────────────────────────────────────────────
    /// One or more typed exceptions reported by the server.
    #[error("{}", format_exceptions(.0))]
    Client(Vec<ClientException>),

    /// HTTP 404 without a typed exception body.
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// HTTP 412: the `If-Match` entity tag no longer matches.
    #[error("Entity was modified concurrently: {message}")]
    PreconditionFailed { message: String },

    /// Any other non-success status without a typed body.
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

fn format_exceptions(exceptions: &[ClientException]) -> String {
    exceptions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Returns `true` if this error means the session is no longer valid
    /// and logging in again might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        match self {
            Self::Unauthorized { message } => message.to_lowercase().contains("expired"),
            Self::Authentication { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Client(exceptions) => exceptions.iter().any(|e| e.status == 404),
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// The HTTP status associated with this error, when one is known.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::PreconditionFailed { .. } => Some(412),
            Self::Server { status, .. } => Some(*status),
            Self::Client(exceptions) => exceptions.first().map(|e| e.status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_exceptions_join_with_semicolon() {
        let err = Error::Client(vec![
            ClientException {
                status: 400,
                kind: "InvalidUser".into(),
                elements: vec!["username is required".into(), "realm is invalid".into()],
            },
            ClientException {
                status: 400,
                kind: "RequiredValuesMissing".into(),
                elements: vec!["email".into()],
            },
        ]);
        assert_eq!(
            err.to_string(),
            "InvalidUser: username is required, realm is invalid; RequiredValuesMissing: email"
        );
    }

    #[test]
    fn expired_detection_is_case_insensitive() {
        let err = Error::Unauthorized {
            message: "Token EXPIRED".into(),
        };
        assert!(err.is_auth_expired());
        let err = Error::Unauthorized {
            message: "bad signature".into(),
        };
        assert!(!err.is_auth_expired());
    }
}
