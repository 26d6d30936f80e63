//! Run configuration.
//!
//! Settings are sampled from the process environment once at startup into a
//! [`Settings`] map and validated into a typed [`Config`] on every trigger.
//! Validating per trigger means a misconfigured deployment answers 400 and
//! keeps serving instead of refusing to start.
//!
//! # Keys
//!
//! Required:
//! - `AUTH0_DOMAIN`, `AUTH0_CLIENT_ID`, `AUTH0_CLIENT_SECRET`
//! - `LOGANALYTICS_WORKSPACEID`, `LOGANALYTICS_WORKSPACEKEY` (base64), `LOGANALYTICS_NAMESPACE`
//!
//! Optional:
//! - `LOGANALYTICS_APIVERSION` (default `2016-04-01`)
//! - `BATCH_SIZE` (default and maximum 100)
//! - `AUTH0_BASE_URL` (default `https://<AUTH0_DOMAIN>`)
//! - `LOGANALYTICS_BASE_URL` (default `https://<workspace>.ods.opinsights.azure.com`)

use std::collections::BTreeMap;
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use crate::credentials::CredentialRequest;
use crate::source::MAX_PAGE_SIZE;

pub const AUTH0_DOMAIN: &str = "AUTH0_DOMAIN";
pub const AUTH0_CLIENT_ID: &str = "AUTH0_CLIENT_ID";
pub const AUTH0_CLIENT_SECRET: &str = "AUTH0_CLIENT_SECRET";
pub const AUTH0_BASE_URL: &str = "AUTH0_BASE_URL";
pub const LOGANALYTICS_WORKSPACEID: &str = "LOGANALYTICS_WORKSPACEID";
pub const LOGANALYTICS_WORKSPACEKEY: &str = "LOGANALYTICS_WORKSPACEKEY";
pub const LOGANALYTICS_NAMESPACE: &str = "LOGANALYTICS_NAMESPACE";
pub const LOGANALYTICS_APIVERSION: &str = "LOGANALYTICS_APIVERSION";
pub const LOGANALYTICS_BASE_URL: &str = "LOGANALYTICS_BASE_URL";
pub const BATCH_SIZE: &str = "BATCH_SIZE";

/// Every key [`Settings::from_env`] samples.
pub const KNOWN_KEYS: &[&str] = &[
    AUTH0_DOMAIN,
    AUTH0_CLIENT_ID,
    AUTH0_CLIENT_SECRET,
    AUTH0_BASE_URL,
    LOGANALYTICS_WORKSPACEID,
    LOGANALYTICS_WORKSPACEKEY,
    LOGANALYTICS_NAMESPACE,
    LOGANALYTICS_APIVERSION,
    LOGANALYTICS_BASE_URL,
    BATCH_SIZE,
];

/// Data Collector API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "2016-04-01";

/// Errors produced while validating settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more required settings are absent or blank.
    #[error("missing required settings: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    /// A setting is present but unusable.
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Raw key/value settings.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Settings(BTreeMap<String, String>);

impl Settings {
    /// Samples every [`KNOWN_KEYS`] entry from the process environment.
    pub fn from_env() -> Self {
        Settings(
            KNOWN_KEYS
                .iter()
                .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
                .collect(),
        )
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Settings(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns a trimmed, non-empty value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) {
        self.0.remove(key);
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values may be secrets; keys are enough to debug a deployment.
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// Where and how to read logs from the source.
#[derive(Clone)]
pub struct SourceConfig {
    pub domain: String,
    /// Scheme and host, without a trailing slash.
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Requested page size, already clamped to `1..=MAX_PAGE_SIZE`.
    pub page_size: usize,
}

impl SourceConfig {
    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.base_url)
    }

    pub fn audience(&self) -> String {
        format!("{}/api/v2/", self.base_url)
    }

    pub fn credential_request(&self) -> CredentialRequest {
        CredentialRequest {
            token_url: self.token_url(),
            audience: self.audience(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("domain", &self.domain)
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

/// Where and how to deliver records to the sink.
#[derive(Clone)]
pub struct SinkConfig {
    pub workspace_id: String,
    /// Decoded shared key.
    pub workspace_key: Vec<u8>,
    /// Custom log type the records land under.
    pub namespace: String,
    pub api_version: String,
    /// Scheme and host, without a trailing slash.
    pub base_url: String,
}

impl SinkConfig {
    /// Full ingestion URL including the API version.
    pub fn ingest_url(&self) -> String {
        format!("{}/api/logs?api-version={}", self.base_url, self.api_version)
    }
}

impl fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkConfig")
            .field("workspace_id", &self.workspace_id)
            .field("namespace", &self.namespace)
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Validated configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceConfig,
    pub sink: SinkConfig,
}

impl Config {
    /// Validates settings, reporting every missing required key at once.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let required = [
            AUTH0_DOMAIN,
            AUTH0_CLIENT_ID,
            AUTH0_CLIENT_SECRET,
            LOGANALYTICS_WORKSPACEID,
            LOGANALYTICS_WORKSPACEKEY,
            LOGANALYTICS_NAMESPACE,
        ];
        let missing: Vec<&'static str> = required
            .into_iter()
            .filter(|key| settings.get(key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        // Checked above.
        let require = |key: &'static str| settings.get(key).unwrap_or_default().to_string();

        let domain = require(AUTH0_DOMAIN);
        let source_base_url = match settings.get(AUTH0_BASE_URL) {
            Some(url) => parse_base_url(AUTH0_BASE_URL, url)?,
            None => format!("https://{}", domain.trim_end_matches('/')),
        };

        let workspace_id = require(LOGANALYTICS_WORKSPACEID);
        let workspace_key = STANDARD
            .decode(require(LOGANALYTICS_WORKSPACEKEY))
            .map_err(|e| ConfigError::Invalid {
                key: LOGANALYTICS_WORKSPACEKEY,
                reason: format!("not valid base64: {e}"),
            })?;
        let sink_base_url = match settings.get(LOGANALYTICS_BASE_URL) {
            Some(url) => parse_base_url(LOGANALYTICS_BASE_URL, url)?,
            None => format!("https://{workspace_id}.ods.opinsights.azure.com"),
        };

        Ok(Config {
            source: SourceConfig {
                domain,
                base_url: source_base_url,
                client_id: require(AUTH0_CLIENT_ID),
                client_secret: require(AUTH0_CLIENT_SECRET),
                page_size: parse_page_size(settings.get(BATCH_SIZE))?,
            },
            sink: SinkConfig {
                workspace_id,
                workspace_key,
                namespace: require(LOGANALYTICS_NAMESPACE),
                api_version: settings
                    .get(LOGANALYTICS_APIVERSION)
                    .unwrap_or(DEFAULT_API_VERSION)
                    .to_string(),
                base_url: sink_base_url,
            },
        })
    }
}

fn parse_page_size(raw: Option<&str>) -> Result<usize, ConfigError> {
    let Some(raw) = raw else {
        return Ok(MAX_PAGE_SIZE);
    };

    match raw.parse::<usize>() {
        Ok(0) => Err(ConfigError::Invalid {
            key: BATCH_SIZE,
            reason: "must be at least 1".to_string(),
        }),
        Ok(n) => Ok(n.min(MAX_PAGE_SIZE)),
        Err(e) => Err(ConfigError::Invalid {
            key: BATCH_SIZE,
            reason: e.to_string(),
        }),
    }
}

fn parse_base_url(key: &'static str, raw: &str) -> Result<String, ConfigError> {
    if !(raw.starts_with("https://") || raw.starts_with("http://")) {
        return Err(ConfigError::Invalid {
            key,
            reason: "must start with http:// or https://".to_string(),
        });
    }
    Ok(raw.trim_end_matches('/').to_string())
}
