use tracing::{debug, info, warn};

use super::{DeliveryOutcome, LogSink};
use crate::types::NormalizedLogRecord;

/// Per-record outcomes of one export, in input order.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub outcomes: Vec<DeliveryOutcome>,
    pub accepted: usize,
    pub rejected: usize,
}

impl ExportReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }
}

/// Delivers `records` one at a time, in order, continuing past rejections.
pub async fn export<S: LogSink>(sink: &S, records: &[NormalizedLogRecord]) -> ExportReport {
    let mut report = ExportReport {
        outcomes: Vec::with_capacity(records.len()),
        ..ExportReport::default()
    };

    for record in records {
        let outcome = DeliveryOutcome::from(sink.push(record).await);
        match &outcome {
            DeliveryOutcome::Accepted => {
                report.accepted += 1;
                debug!(id = %record.id, "Record accepted by sink");
            }
            DeliveryOutcome::Rejected(rejection) => {
                report.rejected += 1;
                warn!(id = %record.id, error = %rejection, "Record rejected by sink");
            }
        }
        report.outcomes.push(outcome);
    }

    info!(
        attempted = report.attempted(),
        accepted = report.accepted,
        rejected = report.rejected,
        "Export finished"
    );
    report
}
