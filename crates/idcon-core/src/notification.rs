// ── Session notifications ──
//
// Operator-facing messages queued by the session and drained by the
// front end (toasts in the TUI, stderr lines in the CLI).

use std::time::SystemTime;

use serde::Serialize;
use strum::Display;

use crate::error::CoreError;

/// Text shown after an action completes.
pub const SUCCESS_MESSAGE: &str = "Operation executed successfully";

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired: please login again";

pub const ACCESS_DENIED_MESSAGE: &str =
    "Insufficient access rights when performing the requested operation";

pub const CONNECTION_MESSAGE: &str = "There was an error while contacting the Core server";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    #[serde(skip)]
    pub at: SystemTime,
}

impl Notification {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: SystemTime::now(),
        }
    }

    pub fn success() -> Self {
        Self::new(Level::Success, SUCCESS_MESSAGE)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }
}

/// Operator-facing text for an error.
pub fn describe(err: &CoreError) -> String {
    match err {
        CoreError::Rejected(_) => err.to_string(),
        CoreError::Unauthorized { message, .. } | CoreError::AuthenticationFailed { message } => {
            if message.to_lowercase().contains("expired") {
                SESSION_EXPIRED_MESSAGE.into()
            } else {
                ACCESS_DENIED_MESSAGE.into()
            }
        }
        CoreError::ConnectionFailed { .. } | CoreError::Timeout => CONNECTION_MESSAGE.into(),
        CoreError::Api { status, .. } if matches!(status, None | Some(400)) => {
            CONNECTION_MESSAGE.into()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use idcon_api::ClientException;

    use super::*;

    #[test]
    fn composite_exceptions_join_with_semicolon() {
        let err = CoreError::Rejected(vec![
            ClientException {
                status: 400,
                kind: "InvalidUser".into(),
                elements: vec!["username".into(), "realm".into()],
            },
            ClientException {
                status: 400,
                kind: "RequiredValuesMissing".into(),
                elements: vec!["firstname".into()],
            },
        ]);
        assert_eq!(
            describe(&err),
            "InvalidUser: username, realm; RequiredValuesMissing: firstname"
        );
    }

    #[test]
    fn expired_token_asks_for_login() {
        let err = CoreError::Unauthorized {
            message: "JWT Token EXPIRED".into(),
            status: 401,
        };
        assert_eq!(describe(&err), SESSION_EXPIRED_MESSAGE);
        let err = CoreError::Unauthorized {
            message: "missing USER_DELETE".into(),
            status: 403,
        };
        assert_eq!(describe(&err), ACCESS_DENIED_MESSAGE);
    }

    #[test]
    fn transport_failures_mention_core() {
        assert_eq!(describe(&CoreError::Timeout), CONNECTION_MESSAGE);
        let err = CoreError::Api {
            message: "bad".into(),
            status: Some(400),
        };
        assert_eq!(describe(&err), CONNECTION_MESSAGE);
        let err = CoreError::Api {
            message: "boom".into(),
            status: Some(500),
        };
        assert_eq!(describe(&err), "API error: boom");
    }
}
