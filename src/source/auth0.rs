//! Auth0 Management API log source.
//!
//! Pages through `GET /api/v2/logs` with checkpoint pagination: `from` is the
//! id of the last event already seen and `sort=date:1` returns newer events
//! oldest first.

use std::future::Future;

use reqwest::header::ACCEPT;
use tracing::debug;

use super::error::SourceError;
use super::LogSource;
use super::fetcher::clamp_page_size;
use crate::credentials::Credential;
use crate::types::{Cursor, RawLogRecord, display_cursor};

/// Reads log events from an Auth0 tenant.
#[derive(Debug, Clone)]
pub struct Auth0LogSource {
    http: reqwest::Client,
    /// Scheme and host, without a trailing slash.
    base_url: String,
}

impl Auth0LogSource {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Auth0LogSource {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn logs_url(&self) -> String {
        format!("{}/api/v2/logs", self.base_url)
    }
}

impl LogSource for Auth0LogSource {
    fn fetch_page(
        &self,
        credential: &Credential,
        from: Option<&Cursor>,
        take: usize,
    ) -> impl Future<Output = Result<Vec<RawLogRecord>, SourceError>> + Send {
        async move {
            let take = clamp_page_size(take).to_string();
            let mut query: Vec<(&str, &str)> = vec![
                ("take", take.as_str()),
                ("per_page", take.as_str()),
                ("sort", "date:1"),
            ];
            if let Some(from) = from {
                query.push(("from", from.as_str()));
            }

            debug!(from = display_cursor(from), take = %take, "Requesting log page");

            let response = self
                .http
                .get(self.logs_url())
                .query(&query)
                .bearer_auth(credential.token())
                .header(ACCEPT, "application/json")
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(SourceError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let bytes = response.bytes().await?;
            let records: Vec<RawLogRecord> = serde_json::from_slice(&bytes)?;
            Ok(records)
        }
    }
}
