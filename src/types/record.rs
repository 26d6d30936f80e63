//! Log records as fetched from the source feed and as delivered to the sink.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::catalog::Severity;
use super::ids::Cursor;

/// A log event as returned by the source `GET /api/v2/logs` endpoint.
///
/// Only the fields the transformer reads are typed. Everything else the
/// source sends is kept verbatim in `extra` and forwarded untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLogRecord {
    /// Stable event id, also used as the pagination cursor.
    #[serde(rename = "_id")]
    pub id: String,

    /// Short event type code (e.g. `"s"`, `"fp"`).
    #[serde(rename = "type", default)]
    pub event_type: String,

    /// Event timestamp (ISO 8601). The sink uses it as the generated-time field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Free-text or structured event details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,

    /// Raw `User-Agent` header of the client that triggered the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// All other source-defined attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawLogRecord {
    /// Returns this record's id as a cursor.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.id.clone())
    }
}

/// A log event after normalization, in the shape the sink ingests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLogRecord {
    #[serde(rename = "_id")]
    pub id: String,

    /// Human-readable event name, or the original code when it is unknown.
    #[serde(rename = "type")]
    pub event_type: String,

    /// The original short type code.
    pub type_code: String,

    /// Catalog severity. Absent for unknown codes and unclassified events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Severity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Details, truncated to fit the sink's field size limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    pub os: String,
    pub os_version: String,
    pub device: String,
    pub device_version: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
