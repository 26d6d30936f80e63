//! One extraction run, from loading the checkpoint to committing the next.
//!
//! # Phases
//!
//! ```text
//! Idle -> Fetching -> Exporting -> Committing -> Done
//!   \________\_____________________\_________-> Failed
//! ```
//!
//! - **Idle**: load the checkpoint and acquire a credential. Failure here
//!   leaves the checkpoint untouched.
//! - **Fetching**: read everything after the checkpoint. A fetch that fails
//!   before gathering a single record fails the run; a fetch that fails later
//!   continues with what it has.
//! - **Exporting**: normalize and deliver every record, one at a time.
//! - **Committing**: persist the next checkpoint per [`decide_checkpoint`].
//!
//! # Delivery guarantee
//!
//! At least once. The checkpoint moves past a batch as soon as one record of
//! it is accepted, so rejected records in an otherwise accepted batch are not
//! retried. A batch with no accepted record is fetched again next run.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::checkpoint::{CheckpointStore, StorageError};
use crate::credentials::{CredentialError, CredentialProvider, CredentialRequest};
use crate::sink::{LogSink, export};
use crate::source::{FetchOptions, FetchOutcome, LogSource, SourceError, fetch_all};
use crate::transform::normalize;
use crate::types::{Cursor, display_cursor};


/// Where a run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Fetching,
    Exporting,
    Committing,
    Done,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::Fetching => "fetching",
            RunPhase::Exporting => "exporting",
            RunPhase::Committing => "committing",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a finished run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub fetched: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Page requests made against the source.
    pub pages: usize,
    pub previous_checkpoint: Option<Cursor>,
    /// The checkpoint this run committed (or tried to).
    pub checkpoint: Option<Cursor>,
    pub checkpoint_advanced: bool,
    /// Set when fetching stopped early; the records before it were exported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

/// Why a run failed.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to load checkpoint: {0}")]
    LoadCheckpoint(#[source] StorageError),

    #[error("authentication failed: {0}")]
    Authentication(#[from] CredentialError),

    #[error("failed to fetch logs: {0}")]
    SourceFetch(#[from] SourceError),

    /// Records were delivered but the next checkpoint could not be saved. The
    /// next run may deliver them again.
    #[error("failed to save checkpoint: {source}")]
    Commit {
        summary: Box<RunSummary>,
        #[source]
        source: StorageError,
    },
}

impl RunError {
    /// Summary of the delivery work done before the failure, if any.
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            RunError::Commit { summary, .. } => Some(summary),
            _ => None,
        }
    }
}

/// Picks the checkpoint to persist at the end of a run.
///
/// `candidate` is the cursor of the last fetched record. It is committed only
/// when at least one record was accepted; otherwise the run leaves the
/// checkpoint where it found it so the same records are fetched again.
pub fn decide_checkpoint(
    original: Option<&Cursor>,
    candidate: Option<&Cursor>,
    accepted: usize,
) -> Option<Cursor> {
    if accepted > 0 {
        candidate.or(original).cloned()
    } else {
        original.cloned()
    }
}

/// Runs one extraction against a set of collaborators.
///
/// Borrowing its collaborators means the same credential provider and store
/// serve every run in a process.
pub struct Orchestrator<'a, Src, Snk, Cred, Store: ?Sized> {
    source: &'a Src,
    sink: &'a Snk,
    credentials: &'a Cred,
    store: &'a Store,
    credential_request: CredentialRequest,
    fetch_options: FetchOptions,
}

impl<'a, Src, Snk, Cred, Store> Orchestrator<'a, Src, Snk, Cred, Store>
where
    Src: LogSource,
    Snk: LogSink,
    Cred: CredentialProvider,
    Store: CheckpointStore + ?Sized,
{
    pub fn new(
        source: &'a Src,
        sink: &'a Snk,
        credentials: &'a Cred,
        store: &'a Store,
        credential_request: CredentialRequest,
    ) -> Self {
        Orchestrator {
            source,
            sink,
            credentials,
            store,
            credential_request,
            fetch_options: FetchOptions::default(),
        }
    }

    pub fn with_fetch_options(mut self, fetch_options: FetchOptions) -> Self {
        self.fetch_options = fetch_options;
        self
    }

    pub async fn run(&self) -> Result<RunSummary, RunError> {
        let result = self.execute().await;
        if let Err(e) = &result {
            enter(RunPhase::Failed);
            error!(error = %e, "Run failed");
        }
        result
    }

    async fn execute(&self) -> Result<RunSummary, RunError> {
        enter(RunPhase::Idle);
        let previous = self.store.load().map_err(RunError::LoadCheckpoint)?;
        info!(
            checkpoint = display_cursor(previous.as_ref()),
            "Starting from checkpoint"
        );

        let credential = self.credentials.get(&self.credential_request).await?;

        enter(RunPhase::Fetching);
        let outcome = fetch_all(
            self.source,
            &credential,
            previous.as_ref(),
            &self.fetch_options,
        )
        .await;
        let candidate = outcome.last_cursor();
        let FetchOutcome {
            records,
            pages,
            error: fetch_error,
        } = outcome;

        let fetch_error = match fetch_error {
            Some(e) if records.is_empty() => return Err(e.into()),
            Some(e) => {
                warn!(
                    error = %e,
                    fetched = records.len(),
                    "Fetch stopped early, exporting partial batch"
                );
                Some(e.to_string())
            }
            None => None,
        };
        let fetched = records.len();

        enter(RunPhase::Exporting);
        let normalized: Vec<_> = records.into_iter().map(normalize).collect();
        let report = export(self.sink, &normalized).await;

        enter(RunPhase::Committing);
        let checkpoint = decide_checkpoint(previous.as_ref(), candidate.as_ref(), report.accepted);
        let summary = RunSummary {
            fetched,
            accepted: report.accepted,
            rejected: report.rejected,
            pages,
            checkpoint_advanced: checkpoint != previous,
            previous_checkpoint: previous,
            checkpoint,
            fetch_error,
        };

        if let Err(source) = self.store.save(summary.checkpoint.as_ref()) {
            warn!(
                accepted = summary.accepted,
                "Records were delivered but the checkpoint is stale"
            );
            return Err(RunError::Commit {
                summary: Box::new(summary),
                source,
            });
        }

        enter(RunPhase::Done);
        info!(
            fetched = summary.fetched,
            accepted = summary.accepted,
            rejected = summary.rejected,
            checkpoint = display_cursor(summary.checkpoint.as_ref()),
            advanced = summary.checkpoint_advanced,
            "Run complete"
        );
        Ok(summary)
    }
}

fn enter(phase: RunPhase) {
    debug!(phase = %phase, "Run phase");
}
