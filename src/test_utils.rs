//! Shared fakes, fixtures and arbitrary generators for tests.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use proptest::prelude::*;
use serde_json::{Map, Value, json};

use crate::checkpoint::{self, CheckpointStore, MemoryCheckpointStore, StorageError};
use crate::credentials::{Credential, CredentialError, CredentialProvider, CredentialRequest};
use crate::sink::{DeliveryRejection, LogSink};
use crate::source::{LogSource, SourceError};
use crate::transform::normalize;
use crate::types::{Cursor, EVENT_TYPES, NormalizedLogRecord, RawLogRecord};

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn raw_record(id: &str, type_code: &str) -> RawLogRecord {
    RawLogRecord {
        id: id.to_string(),
        event_type: type_code.to_string(),
        date: Some("2024-03-01T10:00:00.000Z".to_string()),
        details: None,
        user_agent: None,
        extra: Map::new(),
    }
}

/// `n` successful-login records with ascending ids.
pub fn numbered_records(n: usize) -> Vec<RawLogRecord> {
    (0..n)
        .map(|i| {
            let mut record = raw_record(&format!("log-{i:06}"), "s");
            record.extra.insert("client_id".into(), json!("app"));
            record
        })
        .collect()
}

pub fn normalized_records(n: usize) -> Vec<NormalizedLogRecord> {
    numbered_records(n).into_iter().map(normalize).collect()
}

// ============================================================================
// Generators
// ============================================================================

const SAMPLE_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
    "",
];

pub fn arb_cursor() -> impl Strategy<Value = Cursor> {
    "[0-9a-f]{1,40}".prop_map(Cursor::new)
}

pub fn arb_type_code() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(EVENT_TYPES).prop_map(|event| event.code.to_string()),
        "[a-z_]{0,10}",
    ]
}

pub fn arb_details() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        ".{0,64}".prop_map(Value::String),
        (prop::sample::select(vec!['a', 'é', '€', '\u{1F600}']), 7_000usize..34_000)
            .prop_map(|(ch, n)| Value::String(std::iter::repeat_n(ch, n).collect())),
        (0usize..40_000).prop_map(|n| json!({"error": "x".repeat(n), "code": n})),
    ]
}

pub fn arb_user_agent() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(SAMPLE_AGENTS).prop_map(str::to_string),
        ".{0,200}",
    ]
}

pub fn arb_raw_record() -> impl Strategy<Value = RawLogRecord> {
    (
        "[0-9a-f]{1,24}",
        arb_type_code(),
        prop::option::of(arb_details()),
        prop::option::of(arb_user_agent()),
        prop::collection::btree_map("x_[a-z]{1,6}", "[a-zA-Z0-9 ]{0,16}", 0..4),
    )
        .prop_map(|(id, type_code, details, user_agent, extra)| RawLogRecord {
            id,
            event_type: type_code,
            date: Some("2024-03-01T10:00:00.000Z".to_string()),
            details,
            user_agent,
            extra: extra.into_iter().map(|(k, v)| (k, Value::String(v))).collect(),
        })
}

// ============================================================================
// Fake source
// ============================================================================

/// An in-memory feed paginated by cursor.
///
/// Records must be in feed order. A `from` cursor that names no record is
/// treated as the start of history.
pub struct FakeSource {
    records: Mutex<Vec<RawLogRecord>>,
    calls: Mutex<Vec<(Option<Cursor>, usize)>>,
    fail_from: Option<(usize, u16)>,
    fail_at: Vec<(usize, u16)>,
    repeat_last_page: bool,
}

impl FakeSource {
    pub fn new(records: Vec<RawLogRecord>) -> Self {
        FakeSource {
            records: Mutex::new(records),
            calls: Mutex::new(Vec::new()),
            fail_from: None,
            fail_at: Vec::new(),
            repeat_last_page: false,
        }
    }

    /// Every request numbered `request` (1-based) or later answers `status`.
    pub fn fail_from_request(mut self, request: usize, status: u16) -> Self {
        self.fail_from = Some((request, status));
        self
    }

    /// Only the listed requests (1-based) answer `status`.
    pub fn fail_requests(mut self, requests: &[usize], status: u16) -> Self {
        self.fail_at = requests.iter().map(|&r| (r, status)).collect();
        self
    }

    /// Answers a request from the last record with that record again.
    pub fn repeat_last_page(mut self) -> Self {
        self.repeat_last_page = true;
        self
    }

    pub fn push_records(&self, more: Vec<RawLogRecord>) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(more);
    }

    pub fn request_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn requested_cursors(&self) -> Vec<Option<Cursor>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(cursor, _)| cursor.clone())
            .collect()
    }

    pub fn requested_takes(&self) -> Vec<usize> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, take)| *take)
            .collect()
    }

    fn page(&self, from: Option<&Cursor>, take: usize) -> Vec<RawLogRecord> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let start = from
            .and_then(|cursor| records.iter().position(|r| r.id == cursor.as_str()))
            .map_or(0, |i| i + 1);

        if self.repeat_last_page && start == records.len() && start > 0 {
            return vec![records[start - 1].clone()];
        }
        records.iter().skip(start).take(take).cloned().collect()
    }
}

impl LogSource for FakeSource {
    fn fetch_page(
        &self,
        _credential: &Credential,
        from: Option<&Cursor>,
        take: usize,
    ) -> impl Future<Output = Result<Vec<RawLogRecord>, SourceError>> + Send {
        let request = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            calls.push((from.cloned(), take));
            calls.len()
        };

        let failure = self
            .fail_at
            .iter()
            .find(|(r, _)| *r == request)
            .map(|(_, status)| *status)
            .or(self
                .fail_from
                .filter(|(first, _)| request >= *first)
                .map(|(_, status)| status));

        let result = match failure {
            Some(status) => Err(SourceError::Status {
                status,
                body: "injected failure".into(),
            }),
            None => Ok(self.page(from, take)),
        };
        async move { result }
    }
}

// ============================================================================
// Fake sink
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkMode {
    AcceptAll,
    RejectAll,
    RejectIds(Vec<String>),
}

/// Records what it accepts; rejects according to its mode.
pub struct FakeSink {
    mode: Mutex<SinkMode>,
    attempts: AtomicUsize,
    delivered: Mutex<Vec<NormalizedLogRecord>>,
}

impl FakeSink {
    pub fn new(mode: SinkMode) -> Self {
        FakeSink {
            mode: Mutex::new(mode),
            attempts: AtomicUsize::new(0),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn set_mode(&self, mode: SinkMode) {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner) = mode;
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<NormalizedLogRecord> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn delivered_ids(&self) -> Vec<String> {
        self.delivered().into_iter().map(|r| r.id).collect()
    }
}

impl LogSink for FakeSink {
    fn push(
        &self,
        record: &NormalizedLogRecord,
    ) -> impl Future<Output = Result<(), DeliveryRejection>> + Send {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let accept = match &*self.mode.lock().unwrap_or_else(PoisonError::into_inner) {
            SinkMode::AcceptAll => true,
            SinkMode::RejectAll => false,
            SinkMode::RejectIds(ids) => !ids.contains(&record.id),
        };

        let result = if accept {
            self.delivered
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(record.clone());
            Ok(())
        } else {
            Err(DeliveryRejection::Status {
                status: 503,
                body: "injected rejection".into(),
            })
        };
        async move { result }
    }
}

// ============================================================================
// Fake credentials
// ============================================================================

/// Hands out a fixed token, or always fails.
pub struct StaticCredentials {
    token: Option<String>,
    calls: AtomicUsize,
}

impl StaticCredentials {
    pub fn new(token: &str) -> Self {
        StaticCredentials {
            token: Some(token.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        StaticCredentials {
            token: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CredentialProvider for StaticCredentials {
    fn get(
        &self,
        _request: &CredentialRequest,
    ) -> impl Future<Output = Result<Credential, CredentialError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match &self.token {
            Some(token) => Ok(Credential::new(token.clone())),
            None => Err(CredentialError::Rejected {
                status: 401,
                body: "access_denied".into(),
            }),
        };
        async move { result }
    }
}

pub fn credential_request() -> CredentialRequest {
    CredentialRequest {
        token_url: "https://tenant.auth0.com/oauth/token".into(),
        audience: "https://tenant.auth0.com/api/v2/".into(),
        client_id: "cid".into(),
        client_secret: "secret".into(),
    }
}

// ============================================================================
// Faulty checkpoint store
// ============================================================================

/// A memory store whose reads or writes can be made to fail.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryCheckpointStore,
    pub fail_load: bool,
    pub fail_save: bool,
}

impl FaultyStore {
    pub fn failing_load() -> Self {
        FaultyStore {
            fail_load: true,
            ..FaultyStore::default()
        }
    }

    pub fn failing_save(cursor: Option<&str>) -> Self {
        FaultyStore {
            inner: cursor.map_or_else(MemoryCheckpointStore::new, |c| MemoryCheckpointStore::with_cursor(c)),
            fail_save: true,
            ..FaultyStore::default()
        }
    }
}

impl CheckpointStore for FaultyStore {
    fn load(&self) -> checkpoint::Result<Option<Cursor>> {
        if self.fail_load {
            return Err(StorageError::Rejected("injected load failure".into()));
        }
        self.inner.load()
    }

    fn save(&self, cursor: Option<&Cursor>) -> checkpoint::Result<()> {
        if self.fail_save {
            return Err(StorageError::Rejected("injected save failure".into()));
        }
        self.inner.save(cursor)
    }
}
