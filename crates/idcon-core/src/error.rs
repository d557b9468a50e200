// ── Core error types ──
//
// User-facing errors from idcon-core. Consumers never match on HTTP
// status codes directly; the `From<idcon_api::Error>` impl translates
// transport-layer errors into console-level variants.

use idcon_api::ClientException;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// 401 or 403 on an authenticated call.
    #[error("Not authorized: {message}")]
    Unauthorized { message: String, status: u16 },

    #[error("Not connected")]
    NotConnected,

    #[error("Request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {entity_type} {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    /// The entity changed on the server since it was read.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Typed exceptions reported by the server (validation, integrity).
    #[error("{}", render_exceptions(.0))]
    Rejected(Vec<ClientException>),

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    #[error("Wizard is read-only")]
    ReadOnly,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

fn render_exceptions(exceptions: &[ClientException]) -> String {
    exceptions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CoreError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<idcon_api::Error> for CoreError {
    fn from(err: idcon_api::Error) -> Self {
        match err {
            idcon_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            idcon_api::Error::Unauthorized { message } => CoreError::Unauthorized {
                message,
                status: 401,
            },
            idcon_api::Error::Forbidden { message } => CoreError::Unauthorized {
                message,
                status: 403,
            },
            idcon_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            idcon_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            idcon_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            idcon_api::Error::InvalidHeader { name, message } => {
                CoreError::Internal(format!("Invalid header {name}: {message}"))
            }
            idcon_api::Error::Client(exceptions) => CoreError::Rejected(exceptions),
            idcon_api::Error::NotFound { path } => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: path,
            },
            idcon_api::Error::PreconditionFailed { message } => CoreError::Conflict { message },
            idcon_api::Error::Server { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            idcon_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_keeps_status() {
        let err: CoreError = idcon_api::Error::Forbidden {
            message: "no".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Unauthorized { status: 403, .. }));
    }

    #[test]
    fn stale_etag_becomes_conflict() {
        let err: CoreError = idcon_api::Error::PreconditionFailed {
            message: "etag".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Conflict { .. }));
    }
}
