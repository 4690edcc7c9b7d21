//! Error types for `portal-core`.
//!
//! Login-related variants render as messages that can be shown to the user
//! verbatim. Storage failures are carried through untouched since they point
//! at the environment rather than anything the user typed.

use portal_storage::StorageError;
use serde_json::Value;

/// Fallback when a backend rejects a login without saying why.
pub const GENERIC_LOGIN_FAILURE: &str =
    "login failed, please check your credentials and try again";

/// All errors surfaced by the portal core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested client site is not in the registry. No request was sent.
    #[error("client site '{domain}' is not configured")]
    TenantNotConfigured { domain: String },

    /// The remote host could not be reached at all.
    #[error("could not reach {origin}, please check your connection and try again")]
    SiteUnreachable { origin: String },

    /// The request did not complete within its time limit.
    #[error("the request timed out, please try again")]
    Timeout,

    /// The client site answered 404 on its login endpoint.
    #[error("{origin} does not support portal login")]
    LoginNotSupported { origin: String },

    /// The backend answered 401 to a login attempt.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The backend answered 403 to a login attempt.
    #[error("your account does not have access to this site's admin panel")]
    InsufficientPrivileges,

    /// The backend rejected the request with a message of its own.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// An authenticated call was refused and the session was torn down.
    #[error("session expired, please log in again")]
    Unauthorized,

    /// Any other transport failure.
    #[error("a network error occurred, please try again")]
    Network(#[source] reqwest::Error),

    /// A response body did not have the expected shape.
    #[error("unexpected response from server: {0}")]
    Decode(#[from] serde_json::Error),

    /// The token store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A configuration value could not be used.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Classify a transport-level failure against `origin`.
    pub(crate) fn from_transport(err: reqwest::Error, origin: &str) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::SiteUnreachable {
                origin: origin.to_owned(),
            }
        } else {
            Self::Network(err)
        }
    }

    /// Classify a transport failure while logging into a client site. Only a
    /// timeout is reported as such; anything else means the site could not
    /// be reached.
    pub(crate) fn from_site_transport(err: &reqwest::Error, origin: &str) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::SiteUnreachable {
                origin: origin.to_owned(),
            }
        }
    }

    /// Build a [`Error::Rejected`] from a non-2xx status and its raw body.
    pub(crate) fn rejected(status: reqwest::StatusCode, body: &str) -> Self {
        Self::Rejected {
            status: status.as_u16(),
            message: backend_message(body).unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
        }
    }

    /// HTTP status attached to this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::LoginNotSupported { .. } => Some(404),
            Self::InvalidCredentials | Self::Unauthorized => Some(401),
            Self::InsufficientPrivileges => Some(403),
            _ => None,
        }
    }

    /// Whether the failure was a connectivity problem worth retrying by hand.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::SiteUnreachable { .. } | Self::Timeout | Self::Network(_)
        )
    }
}

/// Pull a human-readable message out of a backend error body.
///
/// Django REST style bodies put it under `error`, `detail`, `message` or
/// `non_field_errors`; each may be a string or a list of strings.
pub(crate) fn backend_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    ["error", "detail", "message", "non_field_errors"]
        .iter()
        .filter_map(|field| json.get(field))
        .find_map(first_text)
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn message_prefers_error_field() {
        let body = r#"{"detail":"second","error":"first"}"#;
        assert_eq!(backend_message(body).as_deref(), Some("first"));
    }

    #[test]
    fn message_reads_first_non_field_error() {
        let body = r#"{"non_field_errors":["Unable to log in with provided credentials."]}"#;
        assert_eq!(
            backend_message(body).as_deref(),
            Some("Unable to log in with provided credentials.")
        );
    }

    #[test]
    fn message_skips_blank_values() {
        let body = r#"{"error":"  ","detail":"Not found."}"#;
        assert_eq!(backend_message(body).as_deref(), Some("Not found."));
    }

    #[test]
    fn non_json_body_has_no_message() {
        assert_eq!(backend_message("<html>502</html>"), None);
    }

    #[test]
    fn rejected_falls_back_to_status_code() {
        let err = Error::rejected(reqwest::StatusCode::BAD_GATEWAY, "");
        assert_eq!(err.to_string(), "HTTP 502");
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn storage_errors_keep_their_message() {
        let err = Error::from(StorageError::Write {
            key: "token".to_owned(),
            reason: "quota exceeded".to_owned(),
        });
        assert_eq!(err.to_string(), "failed to write key 'token': quota exceeded");
        assert!(!err.is_network());
    }
}
