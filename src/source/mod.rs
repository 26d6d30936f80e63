//! Reading audit logs from the source feed.
//!
//! [`LogSource`] is one page request against the source API. [`fetch_all`]
//! drives it from a cursor until the feed is exhausted, retrying transient
//! failures with exponential backoff and keeping whatever it gathered when a
//! page ultimately fails.

use std::future::Future;

use crate::credentials::Credential;
use crate::types::{Cursor, RawLogRecord};

mod auth0;
mod error;
mod fetcher;
mod retry;

pub use auth0::Auth0LogSource;
pub use error::{SourceError, SourceErrorKind};
pub use fetcher::{FetchOptions, FetchOutcome, clamp_page_size, fetch_all};
pub use retry::{RetryConfig, RetryPolicy, retry_with_backoff};

/// The source API never returns more than this many records per page.
pub const MAX_PAGE_SIZE: usize = 100;

/// One page request against the source feed.
///
/// Returns up to `take` records created after `from` (or from the start of
/// history when `from` is `None`), oldest first. An empty page means there is
/// nothing newer.
pub trait LogSource: Send + Sync {
    fn fetch_page(
        &self,
        credential: &Credential,
        from: Option<&Cursor>,
        take: usize,
    ) -> impl Future<Output = Result<Vec<RawLogRecord>, SourceError>> + Send;
}
