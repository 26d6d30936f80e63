//! Delivering normalized records to the log-analytics sink.
//!
//! A [`LogSink`] delivers one record per call. [`export`] walks a batch in
//! order, one request at a time, and records an outcome for every record
//! instead of stopping at the first rejection. No record is retried within a
//! run; the checkpoint policy decides whether the batch is fetched again.

use std::future::Future;

use thiserror::Error;

use crate::types::NormalizedLogRecord;

mod exporter;
mod loganalytics;
pub mod signature;

pub use exporter::{ExportReport, export};
pub use loganalytics::LogAnalyticsSink;
pub use signature::{authorization_header, rfc1123_date, string_to_sign, verify_authorization};

/// Why the sink did not accept a record.
#[derive(Debug, Error)]
pub enum DeliveryRejection {
    /// The sink answered with something other than 200 or 202.
    #[error("sink returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response.
    #[error("sink request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The record could not be encoded as JSON.
    #[error("record could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result of delivering one record.
#[derive(Debug)]
pub enum DeliveryOutcome {
    Accepted,
    Rejected(DeliveryRejection),
}

impl DeliveryOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, DeliveryOutcome::Accepted)
    }
}

impl From<Result<(), DeliveryRejection>> for DeliveryOutcome {
    fn from(result: Result<(), DeliveryRejection>) -> Self {
        match result {
            Ok(()) => DeliveryOutcome::Accepted,
            Err(rejection) => DeliveryOutcome::Rejected(rejection),
        }
    }
}

/// Accepts one record per call.
pub trait LogSink: Send + Sync {
    fn push(
        &self,
        record: &NormalizedLogRecord,
    ) -> impl Future<Output = Result<(), DeliveryRejection>> + Send;
}

impl<T: LogSink> LogSink for std::sync::Arc<T> {
    fn push(
        &self,
        record: &NormalizedLogRecord,
    ) -> impl Future<Output = Result<(), DeliveryRejection>> + Send {
        (**self).push(record)
    }
}
