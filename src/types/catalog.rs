//! Static catalog of source event type codes.
//!
//! Maps the short codes the source puts in a log event's `type` field to a
//! display name and, for most events, a severity. Codes not listed here pass
//! through the transformer unchanged and without a severity.

use serde::{Deserialize, Serialize};
use std::fmt;

use Severity as S;

/// Severity assigned to a catalogued event type.
///
/// Serialized as its numeric level so the sink can filter with `level >= 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Severity {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
    Critical = 4,
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity as u8
    }
}

impl TryFrom<u8> for Severity {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, String> {
        match level {
            0 => Ok(Severity::Debug),
            1 => Ok(Severity::Info),
            2 => Ok(Severity::Warning),
            3 => Ok(Severity::Error),
            4 => Ok(Severity::Critical),
            other => Err(format!("unknown severity level {other}")),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// A catalogued event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventType {
    pub code: &'static str,
    pub name: &'static str,
    pub level: Option<Severity>,
}

const fn event(code: &'static str, name: &'static str, level: Severity) -> EventType {
    EventType {
        code,
        name,
        level: Some(level),
    }
}

const fn unleveled(code: &'static str, name: &'static str) -> EventType {
    EventType {
        code,
        name,
        level: None,
    }
}

/// Every known event type. Codes must be unique (checked by a test).
pub const EVENT_TYPES: &[EventType] = &[
    event("s", "Success Login", S::Info),
    event("seacft", "Success Exchange", S::Info),
    event("seccft", "Success Exchange (Client Credentials)", S::Info),
    event("feacft", "Failed Exchange", S::Error),
    event("feccft", "Failed Exchange (Client Credentials)", S::Error),
    event("f", "Failed Login", S::Error),
    event("w", "Warnings During Login", S::Warning),
    event("du", "Deleted User", S::Info),
    event("fu", "Failed Login (invalid email/username)", S::Error),
    event("fp", "Failed Login (wrong password)", S::Error),
    event("fc", "Failed by Connector", S::Error),
    event("fco", "Failed by CORS", S::Error),
    event("con", "Connector Online", S::Info),
    event("coff", "Connector Offline", S::Error),
    event("fcpro", "Failed Connector Provisioning", S::Critical),
    event("ss", "Success Signup", S::Info),
    event("fs", "Failed Signup", S::Error),
    event("cs", "Code Sent", S::Debug),
    event("cls", "Code/Link Sent", S::Debug),
    event("sv", "Success Verification Email", S::Debug),
    event("fv", "Failed Verification Email", S::Debug),
    event("scp", "Success Change Password", S::Info),
    event("fcp", "Failed Change Password", S::Error),
    event("sce", "Success Change Email", S::Info),
    event("fce", "Failed Change Email", S::Error),
    event("scu", "Success Change Username", S::Info),
    event("fcu", "Failed Change Username", S::Error),
    event("scpn", "Success Change Phone Number", S::Info),
    event("fcpn", "Failed Change Phone Number", S::Error),
    event("svr", "Success Verification Email Request", S::Debug),
    event("fvr", "Failed Verification Email Request", S::Error),
    event("scpr", "Success Change Password Request", S::Debug),
    event("fcpr", "Failed Change Password Request", S::Error),
    event("fn", "Failed Sending Notification", S::Error),
    unleveled("sapi", "API Operation"),
    event("fapi", "Failed API Operation", S::Error),
    event("limit_wc", "Blocked Account", S::Error),
    event("limit_ui", "Too Many Calls to /userinfo", S::Critical),
    event("api_limit", "Rate Limit On API", S::Critical),
    event("limit_mu", "Blocked IP Address", S::Error),
    event("sdu", "Successful User Deletion", S::Info),
    event("fdu", "Failed User Deletion", S::Error),
    event("slo", "Success Logout", S::Info),
    event("flo", "Failed Logout", S::Error),
    event("sd", "Success Delegation", S::Info),
    event("fd", "Failed Delegation", S::Error),
];

/// Looks up an event type by its short code.
pub fn lookup(code: &str) -> Option<&'static EventType> {
    EVENT_TYPES.iter().find(|event| event.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_unique() {
        let mut seen = HashSet::new();
        for event in EVENT_TYPES {
            assert!(seen.insert(event.code), "duplicate code {:?}", event.code);
        }
    }

    #[test]
    fn names_have_no_stray_whitespace() {
        for event in EVENT_TYPES {
            assert_eq!(event.name, event.name.trim(), "code {:?}", event.code);
        }
    }

    #[test]
    fn severity_is_encoded_as_level_number() {
        assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), "3");
        assert_eq!(
            serde_json::from_str::<Severity>("4").unwrap(),
            Severity::Critical
        );

        let err = serde_json::from_str::<Severity>("7").unwrap_err();
        assert!(err.to_string().contains("unknown severity level 7"));
    }

    #[test]
    fn lookup_known_codes() {
        let login = lookup("s").unwrap();
        assert_eq!(login.name, "Success Login");
        assert_eq!(login.level, Some(Severity::Info));

        let wrong_password = lookup("fp").unwrap();
        assert_eq!(wrong_password.level, Some(Severity::Error));
    }

    #[test]
    fn resolved_duplicates_use_later_definitions() {
        assert_eq!(lookup("fapi").unwrap().level, Some(Severity::Error));
        assert_eq!(lookup("limit_wc").unwrap().level, Some(Severity::Error));
    }

    #[test]
    fn api_operation_has_no_level() {
        let sapi = lookup("sapi").unwrap();
        assert_eq!(sapi.name, "API Operation");
        assert_eq!(sapi.level, None);
    }

    #[test]
    fn unknown_code_is_absent() {
        assert!(lookup("gd_enrollment_complete").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn severity_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "4");
        let parsed: Severity = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, Severity::Warning);
        assert!(serde_json::from_str::<Severity>("9").is_err());
    }
}
