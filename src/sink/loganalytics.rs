//! Azure Log Analytics HTTP Data Collector client.

use std::future::Future;

use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use super::signature::{self, authorization_header, rfc1123_date};
use super::{DeliveryRejection, LogSink};
use crate::config::SinkConfig;
use crate::types::NormalizedLogRecord;

/// Field the sink reads the record timestamp from.
const TIME_GENERATED_FIELD: &str = "date";

/// Posts records to one workspace under one custom log type.
#[derive(Debug, Clone)]
pub struct LogAnalyticsSink {
    http: reqwest::Client,
    config: SinkConfig,
}

impl LogAnalyticsSink {
    pub fn new(http: reqwest::Client, config: SinkConfig) -> Self {
        LogAnalyticsSink { http, config }
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }
}

impl LogSink for LogAnalyticsSink {
    fn push(
        &self,
        record: &NormalizedLogRecord,
    ) -> impl Future<Output = Result<(), DeliveryRejection>> + Send {
        let body = serde_json::to_vec(record);
        async move {
            let body = body?;
            let date = rfc1123_date(Utc::now());
            let authorization = authorization_header(
                &self.config.workspace_id,
                &self.config.workspace_key,
                body.len(),
                &date,
            );

            let response = self
                .http
                .post(self.config.ingest_url())
                .header(CONTENT_TYPE, signature::CONTENT_TYPE)
                .header("Log-Type", &self.config.namespace)
                .header("x-ms-date", &date)
                .header("time-generated-field", TIME_GENERATED_FIELD)
                .header(AUTHORIZATION, authorization)
                .body(body)
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::OK || status == StatusCode::ACCEPTED {
                debug!(status = status.as_u16(), "Sink accepted record");
                return Ok(());
            }

            let body = response.text().await.unwrap_or_default();
            Err(DeliveryRejection::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}
