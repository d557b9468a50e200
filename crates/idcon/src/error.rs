//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use idcon_config::ConfigError;
use idcon_core::CoreError;
use idcon_core::notification::describe;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(idcon::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             Reason: {reason}\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(idcon::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(idcon::auth_failed),
        help(
            "Verify the username, password or token and the domain.\n\
             Store a password with: idcon config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(idcon::no_credentials),
        help(
            "Configure credentials with: idcon config init\n\
             Or set IDCON_USERNAME and IDCON_PASSWORD (or IDCON_TOKEN)."
        )
    )]
    NoCredentials { profile: String },

    #[error("{message}")]
    #[diagnostic(
        code(idcon::permission_denied),
        help("Ask an administrator for the entitlement this operation requires.")
    )]
    PermissionDenied { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(idcon::not_found))]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    #[error("{message}")]
    #[diagnostic(
        code(idcon::conflict),
        help("The entity changed since it was read. Fetch it again and retry the edit.")
    )]
    Conflict { message: String },

    // ── Server ───────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(idcon::rejected))]
    Rejected { message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(idcon::api_error))]
    ApiError { message: String },

    #[error("Operation not supported: {operation}")]
    #[diagnostic(code(idcon::unsupported))]
    Unsupported { operation: String },

    /// One or more items of a batch failed; the report was already printed.
    #[error("{summary}")]
    #[diagnostic(code(idcon::batch_failed))]
    BatchFailed { summary: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(idcon::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(idcon::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: idcon config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No server configured")]
    #[diagnostic(
        code(idcon::no_config),
        help(
            "Create a profile with: idcon config init\n\
             Or pass --url. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(idcon::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(idcon::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(idcon::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Could not render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::PermissionDenied { .. } | Self::Unsupported { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout => Self::Timeout,
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Unauthorized { status: 401, message } => Self::AuthFailed { message },
            CoreError::Unauthorized { message, .. } => Self::PermissionDenied { message },
            CoreError::NotConnected => Self::ConnectionFailed {
                url: "(not connected)".into(),
                reason: "no session".into(),
            },
            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                resource_type: entity_type,
                identifier,
            },
            CoreError::Conflict { message } => Self::Conflict { message },
            err @ CoreError::Rejected(_) => Self::Rejected {
                message: describe(&err),
            },
            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Unsupported { operation } => Self::Unsupported { operation },
            CoreError::ReadOnly => Self::Unsupported {
                operation: "editing a read-only entity".into(),
            },
            CoreError::Api { message, .. } | CoreError::Internal(message) => {
                Self::ApiError { message }
            }
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let forbidden: CliError = CoreError::Unauthorized {
            message: "no".into(),
            status: 403,
        }
        .into();
        assert_eq!(forbidden.exit_code(), exit_code::PERMISSION);

        let expired: CliError = CoreError::Unauthorized {
            message: "expired".into(),
            status: 401,
        }
        .into();
        assert_eq!(expired.exit_code(), exit_code::AUTH);

        let stale: CliError = CoreError::Conflict {
            message: "etag".into(),
        }
        .into();
        assert_eq!(stale.exit_code(), exit_code::CONFLICT);
    }

    #[test]
    fn missing_credentials_exit_with_auth_code() {
        let err: CliError = ConfigError::NoCredentials {
            profile: "lab".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
