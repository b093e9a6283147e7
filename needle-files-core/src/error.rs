//! Error taxonomy shared by every remote operation.
//!
//! Failures fall into a small number of kinds (see [`ErrorKind`]):
//! - local precondition failures, raised before any request is sent
//! - platform errors, decoded from the `{"error": {...}}` envelope on status >= 400
//! - transport failures (connect, DNS, timeout), always reported as [`Error::Transport`]
//! - poll termination without a terminal state (bounded policy or cancellation)
//!
//! Files that finish indexing with status `error` are *not* errors; they are reported
//! through [`crate::poller::IndexingReport`].

use serde::Deserialize;

/// Result type for all operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Local validation failed before anything was sent.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The target file already exists and overwrite was not requested.
    #[error("file {name} already exists in collection {collection_id}")]
    Conflict { name: String, collection_id: String },

    /// The platform answered with status >= 400.
    #[error("platform error {status} ({code}): {message}")]
    Platform {
        status: u16,
        code: String,
        message: String,
    },

    /// The platform could not be reached or the exchange was interrupted.
    #[error("transport error: {0}")]
    Transport(String),

    /// A success response did not carry the expected result envelope.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The poll policy ran out of attempts or time.
    #[error("files still indexing after {attempts} polls: {}", .pending.join(", "))]
    PollExhausted { attempts: u32, pending: Vec<String> },

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Coarse classification of [`Error`] for callers that branch on failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Precondition,
    Platform,
    Transport,
    Decode,
    Poll,
    Config,
}

impl Error {
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::Precondition(reason.into())
    }

    pub fn transport(reason: impl ToString) -> Self {
        Self::Transport(reason.to_string())
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    /// Build a platform error from a failed response body.
    ///
    /// Bodies that are not a decodable error envelope still produce a platform
    /// error, with code `unknown` and the raw body as message.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => Self::Platform {
                status,
                code: envelope.error.code,
                message: envelope.error.message,
            },
            Err(_) => Self::Platform {
                status,
                code: "unknown".to_string(),
                message: body.to_string(),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Precondition(_) | Error::Conflict { .. } => ErrorKind::Precondition,
            Error::Platform { .. } => ErrorKind::Platform,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Decode(_) => ErrorKind::Decode,
            Error::PollExhausted { .. } | Error::Cancelled => ErrorKind::Poll,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Machine-readable platform error code, if this is a platform error.
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Platform { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Platform { status, .. } if (400..500).contains(status))
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Platform { status, .. } if *status >= 500)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: PlatformErrorBody,
}

#[derive(Debug, Deserialize)]
struct PlatformErrorBody {
    #[serde(default = "unknown_code")]
    code: String,
    #[serde(default)]
    message: String,
}

fn unknown_code() -> String {
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_error_envelope() {
        let err = Error::from_response(
            404,
            r#"{"error":{"code":"not_found","message":"no such collection"}}"#,
        );
        assert_eq!(err.code(), Some("not_found"));
        assert_eq!(err.kind(), ErrorKind::Platform);
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert!(err.to_string().contains("no such collection"));
    }

    #[test]
    fn undecodable_body_keeps_raw_text() {
        let err = Error::from_response(502, "Bad Gateway");
        match &err {
            Error::Platform {
                status,
                code,
                message,
            } => {
                assert_eq!(*status, 502);
                assert_eq!(code, "unknown");
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("expected platform error, got {other:?}"),
        }
        assert!(err.is_server_error());
    }

    #[test]
    fn conflict_is_a_precondition_failure() {
        let err = Error::Conflict {
            name: "a.pdf".into(),
            collection_id: "c1".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(err.code(), None);
    }
}
