//! Raw-to-normalized record mapping.
//!
//! [`normalize`] is pure and total: every raw record yields exactly one
//! normalized record, whatever its type code, details or user agent.

use serde_json::Value;

use crate::types::catalog::lookup;
use crate::types::{NormalizedLogRecord, RawLogRecord};

pub mod user_agent;

pub use user_agent::{GENERIC_DEVICES, UserAgent};

/// Largest `details` payload the sink accepts in one field, in bytes.
pub const MAX_DETAILS_BYTES: usize = 32_000;

/// Appended to truncated details.
pub const TRUNCATION_MARKER: &str = "...";

/// Maps a raw source record to the shape the sink ingests.
pub fn normalize(raw: RawLogRecord) -> NormalizedLogRecord {
    let RawLogRecord {
        id,
        event_type: type_code,
        date,
        details,
        user_agent,
        extra,
    } = raw;

    let (event_type, level) = match lookup(&type_code) {
        Some(known) => (known.name.to_string(), known.level),
        None => (type_code.clone(), None),
    };

    let agent = user_agent
        .as_deref()
        .map(UserAgent::parse)
        .unwrap_or_default();
    let (device, device_version) = if agent.is_generic_device() {
        (agent.os(), agent.os_version.clone())
    } else {
        (agent.device(), agent.device_version.clone())
    };

    NormalizedLogRecord {
        id,
        event_type,
        type_code,
        level,
        date,
        details: details.map(truncate_details),
        user_agent,
        os: agent.os(),
        os_version: agent.os_version,
        device,
        device_version,
        extra,
    }
}

/// Truncates details that would exceed [`MAX_DETAILS_BYTES`].
///
/// Strings are measured directly. Other values are measured by their JSON
/// encoding and, when too long, replaced by that encoding truncated.
pub fn truncate_details(details: Value) -> Value {
    match details {
        Value::String(text) => Value::String(truncate_text(text)),
        other => {
            let encoded = other.to_string();
            if encoded.len() <= MAX_DETAILS_BYTES {
                other
            } else {
                Value::String(truncate_text(encoded))
            }
        }
    }
}

/// Cuts `text` on a char boundary so that it plus the marker fits the cap.
/// Text already within the cap is returned unchanged.
pub fn truncate_text(mut text: String) -> String {
    if text.len() <= MAX_DETAILS_BYTES {
        return text;
    }

    let mut end = MAX_DETAILS_BYTES - TRUNCATION_MARKER.len();
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
    text.push_str(TRUNCATION_MARKER);
    text
}

/// Byte length of details as the sink will see them.
pub fn details_len(details: &Value) -> usize {
    match details {
        Value::String(text) => text.len(),
        other => other.to_string().len(),
    }
}
