//! Source API error types.
//!
//! Errors are split into transient and permanent so the fetcher knows which
//! ones are worth retrying:
//!
//! - **Transient**: HTTP 408, 429, 5xx, and failures to reach the API at all
//! - **Permanent**: every other status (bad credentials, bad cursor) and
//!   response bodies that don't decode as a list of log events

use thiserror::Error;

/// Retry classification for a [`SourceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Transient,
    Permanent,
}

impl SourceErrorKind {
    pub fn is_retriable(&self) -> bool {
        matches!(self, SourceErrorKind::Transient)
    }
}

/// Failure to read a page from the source API.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request never produced a response.
    #[error("log request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("log API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The API answered 2xx with a body that isn't a list of log events.
    #[error("log API response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SourceError {
    pub fn kind(&self) -> SourceErrorKind {
        match self {
            SourceError::Transport(_) => SourceErrorKind::Transient,
            SourceError::Status { status, .. } => status_kind(*status),
            SourceError::Decode(_) => SourceErrorKind::Permanent,
        }
    }

    /// HTTP status, when the API answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Status { status, .. } => Some(*status),
            SourceError::Transport(e) => e.status().map(|s| s.as_u16()),
            SourceError::Decode(_) => None,
        }
    }
}

fn status_kind(status: u16) -> SourceErrorKind {
    match status {
        408 | 429 => SourceErrorKind::Transient,
        500..=599 => SourceErrorKind::Transient,
        _ => SourceErrorKind::Permanent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16) -> SourceError {
        SourceError::Status {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn rate_limit_and_server_errors_are_transient() {
        assert_eq!(status(429).kind(), SourceErrorKind::Transient);
        assert_eq!(status(408).kind(), SourceErrorKind::Transient);
        assert_eq!(status(500).kind(), SourceErrorKind::Transient);
        assert_eq!(status(503).kind(), SourceErrorKind::Transient);
    }

    #[test]
    fn client_errors_are_permanent() {
        assert_eq!(status(400).kind(), SourceErrorKind::Permanent);
        assert_eq!(status(401).kind(), SourceErrorKind::Permanent);
        assert_eq!(status(403).kind(), SourceErrorKind::Permanent);
        assert_eq!(status(404).kind(), SourceErrorKind::Permanent);
    }

    #[test]
    fn decode_errors_are_permanent() {
        let err: SourceError = serde_json::from_str::<Vec<u8>>("{").unwrap_err().into();
        assert_eq!(err.kind(), SourceErrorKind::Permanent);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn kind_retriable() {
        assert!(SourceErrorKind::Transient.is_retriable());
        assert!(!SourceErrorKind::Permanent.is_retriable());
    }

    #[test]
    fn display_includes_status_and_body() {
        let err = SourceError::Status {
            status: 400,
            body: "invalid from".into(),
        };
        assert_eq!(err.to_string(), "log API returned HTTP 400: invalid from");
        assert_eq!(err.status(), Some(400));
    }
}
