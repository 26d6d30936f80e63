//! Operating system and device detection from `User-Agent` strings.
//!
//! Covers the clients that show up in identity-platform logs: desktop and
//! mobile browsers, the platform SDKs and crawlers. Anything unrecognized
//! parses to empty fields.

use std::sync::LazyLock;

use regex::Regex;

/// Device families that say nothing useful about the hardware.
pub const GENERIC_DEVICES: &[&str] = &["Generic Smartphone", "Generic Tablet"];

/// OS and device parsed from a user agent. Empty strings mean unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAgent {
    pub os_family: String,
    pub os_version: String,
    pub device_family: String,
    pub device_version: String,
}

struct OsRule {
    pattern: Regex,
    family: &'static str,
}

static OS_RULES: LazyLock<Vec<OsRule>> = LazyLock::new(|| {
    // First match wins: iOS agents also mention Mac OS X, Android agents Linux.
    [
        (r"Windows Phone(?: OS)? (\d+(?:\.\d+)*)", "Windows Phone"),
        (r"Windows NT (\d+\.\d+)", "Windows"),
        (r"OS (\d+(?:_\d+)*) like Mac OS X", "iOS"),
        (r"Mac OS X (\d+(?:[_.]\d+)*)", "Mac OS X"),
        (r"Android (\d+(?:\.\d+)*)", "Android"),
        (r"CrOS \S+ (\d+(?:\.\d+)*)", "Chrome OS"),
        (r"Linux", "Linux"),
    ]
    .into_iter()
    .map(|(pattern, family)| OsRule {
        pattern: Regex::new(pattern).expect("static OS pattern"),
        family,
    })
    .collect()
});

static SPIDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:bot|crawler|spider|slurp)\b").expect("static spider pattern")
});

impl UserAgent {
    pub fn parse(header: &str) -> Self {
        let (os_family, os_version) = parse_os(header);
        UserAgent {
            os_family,
            os_version,
            device_family: parse_device(header).to_string(),
            device_version: String::new(),
        }
    }

    /// Family and version, e.g. `"Mac OS X 10.15.7"`.
    pub fn os(&self) -> String {
        join(&self.os_family, &self.os_version)
    }

    pub fn device(&self) -> String {
        join(&self.device_family, &self.device_version)
    }

    pub fn is_generic_device(&self) -> bool {
        GENERIC_DEVICES.contains(&self.device_family.as_str())
    }
}

fn join(family: &str, version: &str) -> String {
    if version.is_empty() {
        family.to_string()
    } else {
        format!("{family} {version}")
    }
}

fn parse_os(header: &str) -> (String, String) {
    for rule in OS_RULES.iter() {
        let Some(captures) = rule.pattern.captures(header) else {
            continue;
        };
        let raw = captures.get(1).map_or("", |m| m.as_str()).replace('_', ".");
        let version = match rule.family {
            "Windows" => windows_release(&raw).to_string(),
            _ => raw,
        };
        return (rule.family.to_string(), version);
    }
    (String::new(), String::new())
}

/// Marketing name for an NT kernel version.
fn windows_release(nt_version: &str) -> &str {
    match nt_version {
        "10.0" => "10",
        "6.3" => "8.1",
        "6.2" => "8",
        "6.1" => "7",
        "6.0" => "Vista",
        "5.1" | "5.2" => "XP",
        other => other,
    }
}

fn parse_device(header: &str) -> &'static str {
    if SPIDER.is_match(header) {
        "Spider"
    } else if header.contains("iPhone") {
        "iPhone"
    } else if header.contains("iPad") {
        "iPad"
    } else if header.contains("iPod") {
        "iPod"
    } else if header.contains("Android") {
        if header.contains("Mobile") {
            "Generic Smartphone"
        } else {
            "Generic Tablet"
        }
    } else if header.contains("Macintosh") {
        "Mac"
    } else {
        ""
    }
}
