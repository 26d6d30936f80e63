//! Shared Key request signing for the Log Analytics Data Collector API.
//!
//! Every ingestion request carries
//! `Authorization: SharedKey <workspace>:<signature>`, where the signature is
//! the base64 HMAC-SHA256 of a canonical string built from the method, body
//! length, content type, `x-ms-date` header and resource path. The HMAC key is
//! the base64-decoded workspace key.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Path every record is posted to.
pub const RESOURCE: &str = "/api/logs";

/// Only JSON bodies are sent.
pub const CONTENT_TYPE: &str = "application/json";

/// Formats `at` as an RFC 1123 date for the `x-ms-date` header.
///
/// ```
/// use audit_forwarder::sink::rfc1123_date;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
/// assert_eq!(rfc1123_date(at), "Mon, 04 Mar 2024 10:00:00 GMT");
/// ```
pub fn rfc1123_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Builds the canonical string that gets signed.
///
/// `content_length` is the body length in bytes.
pub fn string_to_sign(content_length: usize, date: &str) -> String {
    format!("POST\n{content_length}\n{CONTENT_TYPE}\nx-ms-date:{date}\n{RESOURCE}")
}

/// Computes the base64 HMAC-SHA256 of `message` under `key`.
pub fn compute_signature(message: &[u8], key: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Builds the `Authorization` header value for one request.
pub fn authorization_header(
    workspace_id: &str,
    key: &[u8],
    content_length: usize,
    date: &str,
) -> String {
    let signature = compute_signature(string_to_sign(content_length, date).as_bytes(), key);
    format!("SharedKey {workspace_id}:{signature}")
}

/// Checks an `Authorization` header the way the ingestion endpoint does.
///
/// Returns `false` for malformed headers, a different workspace or a bad
/// signature. Comparison is constant time.
pub fn verify_authorization(
    header: &str,
    workspace_id: &str,
    key: &[u8],
    content_length: usize,
    date: &str,
) -> bool {
    let Some((workspace, signature)) = header
        .strip_prefix("SharedKey ")
        .and_then(|rest| rest.split_once(':'))
    else {
        return false;
    };
    if workspace != workspace_id {
        return false;
    }
    let Ok(expected) = STANDARD.decode(signature) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(string_to_sign(content_length, date).as_bytes());
    mac.verify_slice(&expected).is_ok()
}
