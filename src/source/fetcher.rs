//! Paginating the source feed to exhaustion.

use tracing::{debug, info, warn};

use super::error::SourceError;
use super::retry::{RetryConfig, RetryPolicy, retry_with_backoff};
use super::{LogSource, MAX_PAGE_SIZE};
use crate::credentials::Credential;
use crate::types::{Cursor, RawLogRecord, display_cursor};

/// Knobs for one fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchOptions {
    /// Requested records per page; clamped to `1..=MAX_PAGE_SIZE`.
    pub page_size: usize,
    pub retry: RetryConfig,
    pub retry_policy: RetryPolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            page_size: MAX_PAGE_SIZE,
            retry: RetryConfig::DEFAULT,
            retry_policy: RetryPolicy::RetryTransient,
        }
    }
}

/// Everything a fetch gathered.
///
/// `error` is set when a page request failed for good. `records` still holds
/// every record from the pages before it.
#[derive(Debug)]
pub struct FetchOutcome {
    pub records: Vec<RawLogRecord>,
    /// Page requests that got an answer, including the final empty page.
    pub pages: usize,
    pub error: Option<SourceError>,
}

impl FetchOutcome {
    /// Cursor of the last record fetched, if any.
    pub fn last_cursor(&self) -> Option<Cursor> {
        self.records.last().map(RawLogRecord::cursor)
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Clamps a requested page size to what the source accepts.
pub fn clamp_page_size(page_size: usize) -> usize {
    page_size.clamp(1, MAX_PAGE_SIZE)
}

/// Reads every record after `start`, oldest first.
///
/// Stops at the first empty page, at the first page that fails after retries,
/// or at a page whose last id doesn't move the cursor forward.
pub async fn fetch_all<S: LogSource>(
    source: &S,
    credential: &Credential,
    start: Option<&Cursor>,
    options: &FetchOptions,
) -> FetchOutcome {
    let take = clamp_page_size(options.page_size);
    debug!(
        take,
        max_retry_wait = ?options.retry.total_max_wait(),
        "Fetching logs"
    );
    let mut cursor = start.cloned();
    let mut records = Vec::new();
    let mut pages = 0;

    loop {
        let page = retry_with_backoff(options.retry, options.retry_policy, || {
            source.fetch_page(credential, cursor.as_ref(), take)
        })
        .await;

        let page = match page {
            Ok(page) => page,
            Err(e) => {
                warn!(
                    error = %e,
                    after = display_cursor(cursor.as_ref()),
                    fetched = records.len(),
                    "Error getting logs from source"
                );
                return FetchOutcome {
                    records,
                    pages,
                    error: Some(e),
                };
            }
        };
        pages += 1;

        let Some(next) = page.last().map(RawLogRecord::cursor) else {
            info!(total = records.len(), "Reached end of logs");
            break;
        };

        if cursor.as_ref() == Some(&next) {
            warn!(
                cursor = %next,
                "Source returned a page that does not advance the cursor, stopping"
            );
            break;
        }

        records.extend(page);
        debug!(
            total = records.len(),
            after = display_cursor(cursor.as_ref()),
            next = %next,
            "Retrieved log page"
        );
        cursor = Some(next);
    }

    FetchOutcome {
        records,
        pages,
        error: None,
    }
}
