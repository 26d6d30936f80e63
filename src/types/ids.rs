//! Newtype wrappers for identifiers that cross module boundaries.
//!
//! The source feed identifies every log event by an opaque `_id`. The same
//! value doubles as the pagination cursor, so both concepts share one type
//! here rather than passing bare `String`s around.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque position in the source log feed.
///
/// A cursor names the last record a run advanced past. The next request asks
/// for records strictly after it. The value is never interpreted locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub String);

impl Cursor {
    /// Creates a new cursor from a log event id.
    pub fn new(s: impl Into<String>) -> Self {
        Cursor(s.into())
    }

    /// Returns the cursor as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Cursor {
    fn from(s: String) -> Self {
        Cursor(s)
    }
}

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Cursor(s.to_string())
    }
}

/// Formats an optional cursor for log lines, using `<start>` for `None`.
pub fn display_cursor(cursor: Option<&Cursor>) -> &str {
    cursor.map(Cursor::as_str).unwrap_or("<start>")
}
